use serde::{Deserialize, Serialize};

/// Why a cycle ended without finding the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// The page loaded and the target is not listed.
    NoMatch,
    /// An unrecoverable fetch error ended the cycle early.
    Error { message: String },
    /// Every allowed attempt was blocked or failed transiently.
    RetriesSpent { last_error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CycleOutcome {
    Success {
        matched_title: String,
        listing_titles: Vec<String>,
    },
    Exhausted(ExhaustionReason),
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollCycleResult {
    pub outcome: CycleOutcome,
    pub attempts_made: u32,
}

impl PollCycleResult {
    pub fn found(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Success { .. })
    }

    pub fn matched_title(&self) -> Option<&str> {
        match &self.outcome {
            CycleOutcome::Success { matched_title, .. } => Some(matched_title),
            _ => None,
        }
    }

    /// Number of attempts after the first one.
    pub fn retries(&self) -> u32 {
        self.attempts_made.saturating_sub(1)
    }
}
