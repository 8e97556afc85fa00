use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Disguise parameters for a single fetch attempt.
///
/// Drawn fresh from the `ProfileRotator` for every attempt and never mutated
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchProfile {
    pub user_agent: String,
    pub viewport: Viewport,
    /// Extra request headers, ordered by name.
    pub headers: BTreeMap<String, String>,
    /// Retry index within the current cycle; fetchers widen their simulated
    /// interaction pauses as it grows.
    pub humanization_level: u32,
    pub proxy: Option<String>,
}

impl FetchProfile {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
