//! Navigation and form state
//!
//! The current page and the form's progress are plain values handed from
//! the router to the views; nothing is stored between requests.

use crate::models::PredictionResult;
use serde::{Deserialize, Serialize};

/// Pages reachable from the navigation bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Predict,
    About,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::Predict, Page::About];

    pub fn path(self) -> &'static str {
        match self {
            Page::Predict => "/predict",
            Page::About => "/about",
        }
    }

    /// Navigation link text
    pub fn nav_label(self) -> &'static str {
        match self {
            Page::Predict => "Predict Fetal Age",
            Page::About => "About",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Predict => "Fetal Age Prediction App",
            Page::About => "About This App",
        }
    }

    /// Resolve a request path; unknown paths fall back to the predict page
    pub fn from_path(path: &str) -> Page {
        match path.trim_end_matches('/') {
            "/about" => Page::About,
            _ => Page::Predict,
        }
    }
}

/// Result of a submitted form
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success {
        result: PredictionResult,
        message: String,
    },
    Error {
        message: String,
    },
}

impl Outcome {
    pub fn message(&self) -> &str {
        match self {
            Outcome::Success { message, .. } | Outcome::Error { message } => message,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Progress of one form interaction
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormState {
    #[default]
    AwaitingInput,
    ResultDisplayed(Outcome),
}

impl FormState {
    pub fn outcome(&self) -> Option<&Outcome> {
        match self {
            FormState::AwaitingInput => None,
            FormState::ResultDisplayed(outcome) => Some(outcome),
        }
    }

    /// Start a new interaction
    pub fn reset(&mut self) {
        *self = FormState::AwaitingInput;
    }
}
