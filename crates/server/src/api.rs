//! HTTP routes: form pages, prediction API, health checks and Prometheus metrics

use crate::views;
use axum::{
    extract::{rejection::JsonRejection, Form, Query, State},
    http::{StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use gestation_lib::{
    health::{ComponentStatus, HealthRegistry},
    sample_fields, Feature, FormState, InputForm, Page, PredictError, PredictRequest,
    PredictionService, NUM_FEATURES,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: PredictionService,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(service: PredictionService, health_registry: HealthRegistry) -> Self {
        Self {
            service,
            health_registry,
        }
    }
}

/// Errors returned by the JSON API
#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    InvalidInput(String),
    Internal(String),
}

impl From<PredictError> for ApiError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidInput(e) => ApiError::InvalidInput(e.to_string()),
            PredictError::Inference(e) => ApiError::Internal(format!("{:#}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::InvalidInput(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_INPUT", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PredictPageQuery {
    #[serde(default)]
    pub sample: bool,
}

/// Build a form from posted fields; unknown keys are ignored
fn form_from_params(params: &HashMap<String, String>) -> InputForm {
    let mut form = InputForm::new();
    for feature in Feature::ALL {
        if let Some(value) = params.get(feature.key()) {
            form.set(feature, value.as_str());
        }
    }
    form
}

async fn index() -> Redirect {
    Redirect::to(Page::Predict.path())
}

/// Predict page in its initial state, optionally prefilled with sample data
async fn predict_page(Query(query): Query<PredictPageQuery>) -> Html<String> {
    let form = if query.sample {
        InputForm::sample()
    } else {
        InputForm::new()
    };
    Html(views::predict_page(&form, &FormState::AwaitingInput))
}

/// Form submission: either load the sample data or run a prediction
async fn submit_predict(
    State(state): State<Arc<AppState>>,
    Form(params): Form<HashMap<String, String>>,
) -> Html<String> {
    match params.get("action").map(String::as_str) {
        Some("sample") => Html(views::predict_page(
            &InputForm::sample(),
            &FormState::AwaitingInput,
        )),
        _ => {
            let form = form_from_params(&params);
            let result = state.service.submit(&form);
            Html(views::predict_page(&form, &result))
        }
    }
}

async fn about_page() -> Html<String> {
    Html(views::about_page())
}

/// Unknown paths go to the closest known page
async fn fallback(uri: Uri) -> Redirect {
    Redirect::to(Page::from_path(uri.path()).path())
}

/// JSON prediction endpoint
async fn api_predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

    let form = if request.use_sample_data {
        InputForm::sample()
    } else {
        let fields: [String; NUM_FEATURES] = request.fields.try_into().map_err(|f: Vec<String>| {
            ApiError::InvalidRequest(format!(
                "Expected {} fields, got {}",
                NUM_FEATURES,
                f.len()
            ))
        })?;
        InputForm::from_fields(fields)
    };

    let result = state.service.predict_form(&form)?;
    Ok(Json(state.service.formatter().to_response(&result)))
}

async fn api_sample() -> impl IntoResponse {
    Json(sample_fields())
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 once the model is loaded
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", get(predict_page).post(submit_predict))
        .route("/about", get(about_page))
        .route("/api/v1/predict", axum::routing::post(api_predict))
        .route("/api/v1/sample", get(api_sample))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .fallback(fallback)
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
