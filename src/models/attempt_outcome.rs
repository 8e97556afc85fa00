use serde::{Deserialize, Serialize};

/// Classified result of one fetch attempt.
///
/// Produced by the `AttemptClassifier` and consumed immediately by the retry
/// controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Found {
        listing_titles: Vec<String>,
        matched_title: String,
    },
    NotFound {
        listing_titles: Vec<String>,
    },
    Blocked {
        raw_error: String,
    },
    TransientError {
        raw_error: String,
    },
    FatalError {
        raw_error: String,
    },
}

impl AttemptOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Found { .. } => "found",
            AttemptOutcome::NotFound { .. } => "not_found",
            AttemptOutcome::Blocked { .. } => "blocked",
            AttemptOutcome::TransientError { .. } => "transient_error",
            AttemptOutcome::FatalError { .. } => "fatal_error",
        }
    }
}
