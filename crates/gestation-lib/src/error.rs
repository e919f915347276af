//! Error types for the prediction path

use thiserror::Error;

/// Message shown when any field fails to parse
pub const INVALID_INPUT_MESSAGE: &str = "Please enter valid numeric values for all fields.";

/// Raised when one or more form fields are not numbers.
///
/// Deliberately carries no field information; callers only learn that the
/// form as a whole was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Please enter valid numeric values for all fields.")]
pub struct ValidationError;

/// Errors returned by [`crate::predictor::PredictionService`]
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("inference failed: {0:#}")]
    Inference(anyhow::Error),
}

impl PredictError {
    pub fn is_validation(&self) -> bool {
        matches!(self, PredictError::InvalidInput(_))
    }
}
