//! Input collection for the prediction form
//!
//! Holds the raw text of the eight measurement fields for a single
//! interaction. Nothing is validated here; any string is accepted and
//! parsing happens in the prediction service.

use crate::models::{Feature, SampleField, NUM_FEATURES};

/// Canonical example inputs, in feature order
pub const SAMPLE_INPUTS: [&str; NUM_FEATURES] =
    ["28", "12.5", "85.0", "65.0", "320.0", "280.0", "1500.0", "200.0"];

/// Text entered for each of the eight fields plus the sample-data toggle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputForm {
    fields: [String; NUM_FEATURES],
    use_sample: bool,
}

impl InputForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from text already in feature order
    pub fn from_fields(fields: [String; NUM_FEATURES]) -> Self {
        Self {
            fields,
            use_sample: false,
        }
    }

    /// Form with the sample toggle switched on
    pub fn sample() -> Self {
        let mut form = Self::new();
        form.use_sample_data(true);
        form
    }

    pub fn set(&mut self, feature: Feature, text: impl Into<String>) {
        self.fields[feature.index()] = text.into();
    }

    pub fn use_sample_data(&mut self, enabled: bool) {
        self.use_sample = enabled;
    }

    pub fn is_sample(&self) -> bool {
        self.use_sample
    }

    /// Effective text for a field; the sample constant wins while the toggle is on
    pub fn value(&self, feature: Feature) -> &str {
        if self.use_sample {
            SAMPLE_INPUTS[feature.index()]
        } else {
            &self.fields[feature.index()]
        }
    }

    /// Effective text for every field, in feature order
    pub fn raw_fields(&self) -> [&str; NUM_FEATURES] {
        Feature::ALL.map(|f| self.value(f))
    }

    /// Drop everything entered so far
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

/// Sample values with their display metadata
pub fn sample_fields() -> Vec<SampleField> {
    Feature::ALL
        .into_iter()
        .map(|f| SampleField {
            key: f.key().to_string(),
            code: f.code().to_string(),
            label: f.label().to_string(),
            value: SAMPLE_INPUTS[f.index()].to_string(),
        })
        .collect()
}
