//! Prediction request handling
//!
//! Parses the raw form fields, runs the shared predictor and formats the
//! outcome. Each call is independent: the service keeps no per-request state
//! and the predictor is only ever borrowed.

use super::{parse_features, OutputFormatter, Predictor};
use crate::error::{PredictError, ValidationError};
use crate::form::InputForm;
use crate::models::{PredictionResult, NUM_FEATURES};
use crate::observability::{PredictorMetrics, StructuredLogger};
use crate::session::{FormState, Outcome};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Adapter between the input form and the predictor
#[derive(Clone)]
pub struct PredictionService {
    predictor: Arc<dyn Predictor>,
    formatter: OutputFormatter,
    metrics: PredictorMetrics,
    logger: StructuredLogger,
}

impl PredictionService {
    pub fn new(predictor: Arc<dyn Predictor>, logger: StructuredLogger) -> Self {
        Self {
            predictor,
            formatter: OutputFormatter::new(),
            metrics: PredictorMetrics::new(),
            logger,
        }
    }

    pub fn model_version(&self) -> &str {
        self.predictor.model_version()
    }

    pub fn formatter(&self) -> &OutputFormatter {
        &self.formatter
    }

    /// Parse the eight fields and run inference.
    ///
    /// The predictor is never called unless every field parsed.
    pub fn predict<S: AsRef<str>>(
        &self,
        raw: &[S; NUM_FEATURES],
    ) -> Result<PredictionResult, PredictError> {
        let features = match parse_features(raw) {
            Ok(f) => f,
            Err(e) => {
                self.metrics.inc_validation_failures();
                self.logger.log_validation_failure();
                return Err(e.into());
            }
        };

        let outside = features.outside_hints();
        if !outside.is_empty() {
            debug!(fields = ?outside, "Values outside suggested ranges");
        }

        let start = Instant::now();
        let days = self.predictor.predict(&features).map_err(|e| {
            self.metrics.inc_prediction_errors();
            error!(error = %e, "Prediction failed");
            PredictError::Inference(e)
        })?;
        self.metrics
            .observe_prediction_latency(start.elapsed().as_secs_f64());
        self.metrics.inc_predictions_generated();

        let result = PredictionResult::new(days, self.predictor.model_version());
        self.logger.log_prediction(
            days,
            self.formatter.rounded_days(days),
            &result.model_version,
        );
        Ok(result)
    }

    /// Run a prediction for the effective values of a form
    pub fn predict_form(&self, form: &InputForm) -> Result<PredictionResult, PredictError> {
        self.predict(&form.raw_fields())
    }

    /// Submit a form and move it to the displayed-result state
    pub fn submit(&self, form: &InputForm) -> FormState {
        let outcome = match self.predict_form(form) {
            Ok(result) => Outcome::Success {
                message: self.formatter.success_message(&result),
                result,
            },
            Err(PredictError::InvalidInput(ValidationError)) => Outcome::Error {
                message: ValidationError.to_string(),
            },
            Err(e @ PredictError::Inference(_)) => Outcome::Error {
                message: e.to_string(),
            },
        };
        FormState::ResultDisplayed(outcome)
    }
}
