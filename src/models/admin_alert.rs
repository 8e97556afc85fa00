use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// First blocked or transient failure of a cycle.
    FirstFailure,
    /// The last allowed attempt of a cycle failed as well.
    RetriesExhausted,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::FirstFailure => write!(f, "first failure"),
            AlertKind::RetriesExhausted => write!(f, "retries exhausted"),
        }
    }
}

/// Operator-facing alert about blocking or fetch trouble.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminAlert {
    pub kind: AlertKind,
    pub error: String,
    pub retry_index: u32,
    pub target_name: String,
    pub target_url: String,
    pub occurred_at: DateTime<Utc>,
}

impl AdminAlert {
    pub fn new(
        kind: AlertKind,
        error: &str,
        retry_index: u32,
        target_name: &str,
        target_url: &str,
    ) -> Self {
        Self {
            kind,
            error: error.to_string(),
            retry_index,
            target_name: target_name.to_string(),
            target_url: target_url.to_string(),
            occurred_at: Utc::now(),
        }
    }

    pub fn headline(&self) -> String {
        format!("⚠️ Monitor alert ({}): {}", self.kind, self.target_name)
    }

    pub fn body(&self) -> String {
        format!(
            "Checking {} ran into trouble ({}, retry {}).\n\nError: {}\n\nTime: {}",
            self.target_url,
            self.kind,
            self.retry_index,
            self.error,
            self.occurred_at.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}
