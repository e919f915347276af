//! Prediction output formatting
//!
//! Converts the raw model output into the day count shown to the user.

use crate::models::{PredictResponse, PredictionResult};

/// Days per gestational week
pub const DAYS_PER_WEEK: i64 = 7;

/// Prefix of the success message
pub const SUCCESS_PREFIX: &str = "Predicted Gestational Age:";

/// Formats prediction results for display
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Round to whole days, exact halves to the even day
    pub fn rounded_days(&self, days: f32) -> i64 {
        days.round_ties_even() as i64
    }

    /// "275 days"
    pub fn format_days(&self, days: f32) -> String {
        format!("{} days", self.rounded_days(days))
    }

    /// "39 weeks 2 days"
    pub fn format_weeks(&self, days: f32) -> String {
        let total = self.rounded_days(days);
        let weeks = total.div_euclid(DAYS_PER_WEEK);
        let rest = total.rem_euclid(DAYS_PER_WEEK);
        format!("{} weeks {} days", weeks, rest)
    }

    /// Full success message embedding the rounded day count
    pub fn success_message(&self, result: &PredictionResult) -> String {
        format!(
            "{} {}",
            SUCCESS_PREFIX,
            self.format_days(result.gestational_age_days)
        )
    }

    /// API representation of a result
    pub fn to_response(&self, result: &PredictionResult) -> PredictResponse {
        PredictResponse {
            gestational_age_days: result.gestational_age_days,
            rounded_days: self.rounded_days(result.gestational_age_days),
            message: self.success_message(result),
            model_version: result.model_version.clone(),
            generated_at: result.generated_at,
        }
    }
}
