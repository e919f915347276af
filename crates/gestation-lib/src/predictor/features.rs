//! Feature parsing for ML inference
//!
//! Turns the raw text of the eight form fields into a [`FeatureVector`].
//! A vector is produced only when every field parses; otherwise the whole
//! request is rejected with a single, undifferentiated [`ValidationError`].

use crate::error::ValidationError;
use crate::models::{Feature, FeatureVector, NUM_FEATURES};
use tracing::debug;

/// Parse one field. Surrounding whitespace is ignored; NaN and infinities are rejected.
///
/// Text is read as `f64`, so finite literals beyond the `f32` range are
/// accepted and saturate to `±f32::MAX` on the way into the model.
pub fn parse_value(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(f32::MIN as f64, f32::MAX as f64) as f32)
}

/// Parse the eight fields, in feature order, into a feature vector
pub fn parse_features<S: AsRef<str>>(
    raw: &[S; NUM_FEATURES],
) -> Result<FeatureVector, ValidationError> {
    let mut values = [0.0f32; NUM_FEATURES];
    let mut rejected = 0usize;

    for (feature, text) in Feature::ALL.iter().zip(raw.iter()) {
        match parse_value(text.as_ref()) {
            Some(v) => values[feature.index()] = v,
            None => {
                debug!(field = feature.key(), "Field is not a number");
                rejected += 1;
            }
        }
    }

    if rejected > 0 {
        return Err(ValidationError);
    }
    Ok(FeatureVector::from_array(values))
}
