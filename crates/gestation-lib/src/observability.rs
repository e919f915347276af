//! Observability infrastructure for the predictor
//!
//! Provides:
//! - Prometheus metrics (prediction latency, prediction and failure counts, model version)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, GaugeVec, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for inference latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MetricsInner> = OnceLock::new();

struct MetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_generated: IntCounter,
    validation_failures: IntCounter,
    prediction_errors: IntCounter,
    model_version_info: GaugeVec,
}

impl MetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "fetal_age_prediction_latency_seconds",
                "Time spent running model inference",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_generated: register_int_counter!(
                "fetal_age_predictions_total",
                "Total number of successful predictions"
            )
            .expect("Failed to register predictions_total"),

            validation_failures: register_int_counter!(
                "fetal_age_validation_failures_total",
                "Total number of submissions rejected for non-numeric input"
            )
            .expect("Failed to register validation_failures_total"),

            prediction_errors: register_int_counter!(
                "fetal_age_prediction_errors_total",
                "Total number of predictor failures"
            )
            .expect("Failed to register prediction_errors_total"),

            model_version_info: register_gauge_vec!(
                "fetal_age_model_info",
                "Information about the loaded model",
                &["version", "checksum"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Handle to the process-wide prediction metrics.
///
/// Clones share the same underlying collectors.
#[derive(Clone)]
pub struct PredictorMetrics {
    _private: (),
}

impl Default for PredictorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PredictorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MetricsInner {
        GLOBAL_METRICS.get_or_init(MetricsInner::new)
    }

    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    pub fn inc_predictions_generated(&self) {
        self.inner().predictions_generated.inc();
    }

    pub fn inc_validation_failures(&self) {
        self.inner().validation_failures.inc();
    }

    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors.inc();
    }

    pub fn predictions_generated(&self) -> u64 {
        self.inner().predictions_generated.get()
    }

    pub fn validation_failures(&self) -> u64 {
        self.inner().validation_failures.get()
    }

    /// Record the loaded model; only one version is reported at a time
    pub fn set_model_version(&self, version: &str, checksum: &str) {
        self.inner().model_version_info.reset();
        self.inner()
            .model_version_info
            .with_label_values(&[version, checksum])
            .set(1.0);
    }
}

/// Structured logger for predictor events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_startup(&self, version: &str, model_version: &str) {
        info!(
            event = "server_started",
            instance = %self.instance,
            server_version = %version,
            model_version = %model_version,
            "Fetal age predictor started"
        );
    }

    pub fn log_model_loaded(&self, path: &str, model_version: &str, checksum: &str) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            path = %path,
            model_version = %model_version,
            checksum = %checksum,
            "Model loaded"
        );
    }

    pub fn log_prediction(&self, days: f32, rounded_days: i64, model_version: &str) {
        info!(
            event = "prediction_generated",
            instance = %self.instance,
            gestational_age_days = days,
            rounded_days = rounded_days,
            model_version = %model_version,
            "Generated gestational age prediction"
        );
    }

    /// Field values are not logged; they are patient measurements
    pub fn log_validation_failure(&self) {
        warn!(
            event = "validation_failed",
            instance = %self.instance,
            "Rejected submission with non-numeric fields"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "server_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Fetal age predictor shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_counters_advance() {
        let metrics = PredictorMetrics::new();
        let before = metrics.validation_failures();
        metrics.inc_validation_failures();
        assert!(metrics.validation_failures() > before);

        metrics.observe_prediction_latency(0.001);
        metrics.inc_prediction_errors();
        metrics.set_model_version("v1", "abc123");
    }

    #[test]
    fn test_metrics_registered_in_default_registry() {
        let _metrics = PredictorMetrics::new();
        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "fetal_age_prediction_latency_seconds"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-host");
        assert_eq!(logger.instance, "test-host");
    }
}
