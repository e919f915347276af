//! Core library for fetal gestational age prediction
//!
//! This crate provides:
//! - The eight-measurement input form and its sample data
//! - Parsing and validation of the raw form fields
//! - ONNX model inference behind the [`predictor::Predictor`] trait
//! - Navigation and form state for the user-facing surfaces
//! - Health checks and observability

pub mod error;
pub mod form;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod session;

pub use error::{PredictError, ValidationError, INVALID_INPUT_MESSAGE};
pub use form::{sample_fields, InputForm, SAMPLE_INPUTS};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PredictorMetrics, StructuredLogger};
pub use predictor::{OnnxPredictor, OutputFormatter, PredictionService, Predictor};
pub use session::{FormState, Outcome, Page};
