//! Integration tests for the server routes

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use fetal_age_server::api::{create_router, AppState};
use gestation_lib::{
    health::{components, HealthRegistry},
    FeatureVector, PredictionService, Predictor, StructuredLogger, INVALID_INPUT_MESSAGE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Deterministic stand-in for the trained model: LMP plus a small offset
struct StubPredictor {
    calls: AtomicUsize,
}

impl Predictor for StubPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(features.days_since_lmp + 74.6)
    }

    fn model_version(&self) -> &str {
        "stub-v1"
    }
}

async fn setup_test_app() -> (Router, Arc<AppState>, Arc<StubPredictor>) {
    let predictor = Arc::new(StubPredictor {
        calls: AtomicUsize::new(0),
    });
    let service = PredictionService::new(predictor.clone(), StructuredLogger::new("test"));

    let health_registry = HealthRegistry::new();
    health_registry.register(components::API).await;

    let state = Arc::new(AppState::new(service, health_registry));
    (create_router(state.clone()), state, predictor)
}

async fn body_string(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const SAMPLE_FORM: &str = "maternal_age=28&hemoglobin=12.5&bpd=85.0&femur_length=65.0\
&head_circumference=320.0&abdominal_circumference=280.0&estimated_fetal_weight=1500.0\
&days_since_lmp=200.0";

#[tokio::test]
async fn test_root_redirects_to_predict() {
    let (app, _, _) = setup_test_app().await;
    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/predict");
}

#[tokio::test]
async fn test_unknown_path_redirects_to_closest_page() {
    let (app, _, _) = setup_test_app().await;
    let response = app.clone().oneshot(get("/about/")).await.unwrap();
    assert_eq!(response.headers()[header::LOCATION], "/about");

    let response = app.oneshot(get("/settings")).await.unwrap();
    assert_eq!(response.headers()[header::LOCATION], "/predict");
}

#[tokio::test]
async fn test_predict_page_starts_empty() {
    let (app, _, _) = setup_test_app().await;
    let response = app.oneshot(get("/predict")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Fetal Age Prediction App"));
    assert!(html.contains("name=\"femur_length\" value=\"\""));
    assert!(!html.contains("role=\"status\""));
}

#[tokio::test]
async fn test_predict_page_with_sample_query() {
    let (app, _, _) = setup_test_app().await;
    let response = app.oneshot(get("/predict?sample=true")).await.unwrap();

    let html = body_string(response).await;
    assert!(html.contains("name=\"estimated_fetal_weight\" value=\"1500.0\""));
}

#[tokio::test]
async fn test_sample_action_prefills_without_predicting() {
    let (app, _, predictor) = setup_test_app().await;
    let response = app.oneshot(form_post("action=sample")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("name=\"maternal_age\" value=\"28\""));
    assert!(html.contains("name=\"days_since_lmp\" value=\"200.0\""));
    assert!(!html.contains("role=\"status\""));
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_form_predict_success() {
    let (app, _, predictor) = setup_test_app().await;
    let body = format!("{}&action=predict", SAMPLE_FORM);
    let response = app.oneshot(form_post(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("class=\"success\""));
    assert!(html.contains("Predicted Gestational Age: 275 days"));
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_form_predict_invalid_field() {
    let (app, _, predictor) = setup_test_app().await;
    let body = SAMPLE_FORM.replace("bpd=85.0", "bpd=abc") + "&action=predict";
    let response = app.oneshot(form_post(&body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains(INVALID_INPUT_MESSAGE));
    // Entered text is kept so the user can correct it
    assert!(html.contains("name=\"bpd\" value=\"abc\""));
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_about_page() {
    let (app, _, _) = setup_test_app().await;
    let response = app.oneshot(get("/about")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("About This App"));
    assert!(html.contains("EFW"));
}

#[tokio::test]
async fn test_api_predict_success() {
    let (app, _, _) = setup_test_app().await;
    let request = json_post(
        "/api/v1/predict",
        serde_json::json!({
            "fields": ["28", "12.5", "85.0", "65.0", "320.0", "280.0", "1500.0", "200.0"]
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["rounded_days"], 275);
    assert_eq!(body["model_version"], "stub-v1");
    assert_eq!(body["message"], "Predicted Gestational Age: 275 days");
}

#[tokio::test]
async fn test_api_predict_sample_flag() {
    let (app, _, _) = setup_test_app().await;
    let request = json_post(
        "/api/v1/predict",
        serde_json::json!({ "use_sample_data": true }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["rounded_days"], 275);
}

#[tokio::test]
async fn test_api_predict_invalid_input() {
    let (app, _, predictor) = setup_test_app().await;
    let request = json_post(
        "/api/v1/predict",
        serde_json::json!({
            "fields": ["28", "12.5", "abc", "65.0", "320.0", "280.0", "1500.0", "200.0"]
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error_code"], "INVALID_INPUT");
    assert_eq!(body["error"], INVALID_INPUT_MESSAGE);
    assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_api_predict_wrong_field_count() {
    let (app, _, _) = setup_test_app().await;
    let request = json_post(
        "/api/v1/predict",
        serde_json::json!({ "fields": ["28", "12.5"] }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error_code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_api_predict_malformed_body_is_bad_request() {
    let (app, _, predictor) = setup_test_app().await;

    // Numbers instead of strings
    let request = json_post(
        "/api/v1/predict",
        serde_json::json!({
            "fields": [28, 12.5, 85.0, 65.0, 320.0, 280.0, 1500.0, 200.0]
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error_code"], "INVALID_REQUEST");
    assert!(body["error"].as_str().unwrap().contains("fields"));

    // Not JSON at all
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error_code"], "INVALID_REQUEST");

    assert_eq!(predictor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_api_sample_values() {
    let (app, _, _) = setup_test_app().await;
    let response = app.oneshot(get("/api/v1/sample")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let values: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["value"].as_str().unwrap())
        .collect();
    assert_eq!(
        values,
        ["28", "12.5", "85.0", "65.0", "320.0", "280.0", "1500.0", "200.0"]
    );
}

#[tokio::test]
async fn test_readyz_reflects_model_state() {
    let (app, state, _) = setup_test_app().await;

    let response = app.clone().oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.health_registry.model_loaded("stub-v1").await;
    let response = app.oneshot(get("/readyz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_healthz_status_codes() {
    let (app, state, _) = setup_test_app().await;
    state.health_registry.model_loaded("stub-v1").await;

    let response = app.clone().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["model_version"], "stub-v1");

    state
        .health_registry
        .set_unhealthy(components::MODEL, "Inference failing")
        .await;
    let response = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint_counts_predictions() {
    let (app, _, _) = setup_test_app().await;
    let request = json_post(
        "/api/v1/predict",
        serde_json::json!({ "use_sample_data": true }),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = body_string(response).await;
    assert!(text.contains("fetal_age_predictions_total"));
    assert!(text.contains("fetal_age_prediction_latency_seconds"));
}
