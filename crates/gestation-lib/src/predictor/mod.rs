//! ML prediction engine

mod features;
mod inference;
mod output;
mod service;
mod tree_ensemble;

pub use features::{parse_features, parse_value};
pub use inference::{compute_checksum, InferenceStats, OnnxPredictor};
pub use output::{OutputFormatter, DAYS_PER_WEEK, SUCCESS_PREFIX};
pub use service::PredictionService;

use crate::models::FeatureVector;
use anyhow::Result;

/// Trait for prediction implementations
pub trait Predictor: Send + Sync {
    /// Predict gestational age in days from a complete feature vector
    fn predict(&self, features: &FeatureVector) -> Result<f32>;

    /// Get current model version
    fn model_version(&self) -> &str;
}
