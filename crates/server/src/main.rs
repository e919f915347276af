//! Fetal Age Predictor - web form and prediction API
//!
//! Loads the regression model once at startup and serves it to every
//! request until shutdown.

use anyhow::{Context, Result};
use fetal_age_server::{api, config::ServerConfig};
use gestation_lib::{
    health::{components, HealthRegistry},
    OnnxPredictor, PredictionService, PredictorMetrics, StructuredLogger,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting fetal-age-server");

    let config = ServerConfig::load()?;
    let addr = config.socket_addr()?;
    info!(model_path = %config.model_path.display(), addr = %addr, "Server configured");

    let logger = StructuredLogger::new(&config.instance_name);
    let health_registry = HealthRegistry::new();
    health_registry.register(components::API).await;

    // A missing or corrupt model aborts startup rather than failing on first use
    let predictor = OnnxPredictor::from_file(
        &config.model_path,
        &config.model_version,
        config.model_checksum.as_deref(),
    )
    .with_context(|| format!("Failed to load model from {}", config.model_path.display()))
    .inspect_err(|e| error!(error = %format!("{:#}", e), "Model load failed"))?;

    let metrics = PredictorMetrics::new();
    metrics.set_model_version(&config.model_version, predictor.checksum());
    logger.log_model_loaded(
        &config.model_path.display().to_string(),
        &config.model_version,
        predictor.checksum(),
    );

    let service = PredictionService::new(Arc::new(predictor), logger.clone());
    health_registry.model_loaded(service.model_version()).await;

    let app_state = Arc::new(api::AppState::new(service, health_registry));
    logger.log_startup(SERVER_VERSION, &config.model_version);

    let shutdown_logger = logger.clone();
    api::serve(addr, app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shut down");
    Ok(())
}
