//! Core data models for the fetal age predictor

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of measurements the model consumes
pub const NUM_FEATURES: usize = 8;

/// One position of the feature vector, in model input order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MaternalAge,
    Hemoglobin,
    BiparietalDiameter,
    FemurLength,
    HeadCircumference,
    AbdominalCircumference,
    EstimatedFetalWeight,
    DaysSinceLmp,
}

impl Feature {
    /// All features in the order the model expects them
    pub const ALL: [Feature; NUM_FEATURES] = [
        Feature::MaternalAge,
        Feature::Hemoglobin,
        Feature::BiparietalDiameter,
        Feature::FemurLength,
        Feature::HeadCircumference,
        Feature::AbdominalCircumference,
        Feature::EstimatedFetalWeight,
        Feature::DaysSinceLmp,
    ];

    /// Position in the model input
    pub fn index(self) -> usize {
        self as usize
    }

    /// Form field / query parameter name
    pub fn key(self) -> &'static str {
        match self {
            Feature::MaternalAge => "maternal_age",
            Feature::Hemoglobin => "hemoglobin",
            Feature::BiparietalDiameter => "bpd",
            Feature::FemurLength => "femur_length",
            Feature::HeadCircumference => "head_circumference",
            Feature::AbdominalCircumference => "abdominal_circumference",
            Feature::EstimatedFetalWeight => "estimated_fetal_weight",
            Feature::DaysSinceLmp => "days_since_lmp",
        }
    }

    /// Short code used in the training data
    pub fn code(self) -> &'static str {
        match self {
            Feature::MaternalAge => "Age",
            Feature::Hemoglobin => "Hem",
            Feature::BiparietalDiameter => "BPD",
            Feature::FemurLength => "FFL",
            Feature::HeadCircumference => "HC",
            Feature::AbdominalCircumference => "AC",
            Feature::EstimatedFetalWeight => "EFW",
            Feature::DaysSinceLmp => "LMP",
        }
    }

    /// Human-readable label including the unit
    pub fn label(self) -> &'static str {
        match self {
            Feature::MaternalAge => "Maternal Age (years)",
            Feature::Hemoglobin => "Hemoglobin Level (g/dL)",
            Feature::BiparietalDiameter => "Biparietal Diameter (mm)",
            Feature::FemurLength => "Femur Length (mm)",
            Feature::HeadCircumference => "Head Circumference (mm)",
            Feature::AbdominalCircumference => "Abdominal Circumference (mm)",
            Feature::EstimatedFetalWeight => "Estimated Fetal Weight (g)",
            Feature::DaysSinceLmp => "Days Since Last Menstrual Period (LMP)",
        }
    }

    /// Suggested input range shown next to the field.
    ///
    /// These are display hints only; values outside them still reach the model.
    pub fn hint_range(self) -> (f32, f32) {
        match self {
            Feature::MaternalAge => (10.0, 60.0),
            Feature::Hemoglobin => (5.0, 20.0),
            Feature::BiparietalDiameter => (0.0, 100.0),
            Feature::FemurLength => (0.0, 100.0),
            Feature::HeadCircumference => (0.0, 500.0),
            Feature::AbdominalCircumference => (0.0, 500.0),
            Feature::EstimatedFetalWeight => (0.0, 1000.0),
            Feature::DaysSinceLmp => (0.0, 300.0),
        }
    }

    /// Look up a feature by its form key
    pub fn from_key(key: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Feature vector for ML inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub maternal_age: f32,
    pub hemoglobin: f32,
    pub biparietal_diameter: f32,
    pub femur_length: f32,
    pub head_circumference: f32,
    pub abdominal_circumference: f32,
    pub estimated_fetal_weight: f32,
    pub days_since_lmp: f32,
}

impl FeatureVector {
    /// Build from values already in model order
    pub fn from_array(values: [f32; NUM_FEATURES]) -> Self {
        let [maternal_age, hemoglobin, biparietal_diameter, femur_length, head_circumference, abdominal_circumference, estimated_fetal_weight, days_since_lmp] =
            values;
        Self {
            maternal_age,
            hemoglobin,
            biparietal_diameter,
            femur_length,
            head_circumference,
            abdominal_circumference,
            estimated_fetal_weight,
            days_since_lmp,
        }
    }

    /// Values in model input order
    pub fn to_array(&self) -> [f32; NUM_FEATURES] {
        [
            self.maternal_age,
            self.hemoglobin,
            self.biparietal_diameter,
            self.femur_length,
            self.head_circumference,
            self.abdominal_circumference,
            self.estimated_fetal_weight,
            self.days_since_lmp,
        ]
    }

    pub fn get(&self, feature: Feature) -> f32 {
        self.to_array()[feature.index()]
    }

    /// Features whose value falls outside the displayed hint range
    pub fn outside_hints(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| {
                let (min, max) = f.hint_range();
                let v = self.get(*f);
                v < min || v > max
            })
            .collect()
    }
}

/// Predicted gestational age produced for one feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub gestational_age_days: f32,
    pub model_version: String,
    pub generated_at: i64,
}

impl PredictionResult {
    pub fn new(gestational_age_days: f32, model_version: impl Into<String>) -> Self {
        Self {
            gestational_age_days,
            model_version: model_version.into(),
            generated_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// JSON body accepted by the prediction API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Raw text of the 8 fields in model order
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub use_sample_data: bool,
}

/// JSON body returned by the prediction API on success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub gestational_age_days: f32,
    pub rounded_days: i64,
    pub message: String,
    pub model_version: String,
    pub generated_at: i64,
}

/// One sample value with the metadata needed to render it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleField {
    pub key: String,
    pub code: String,
    pub label: String,
    pub value: String,
}
