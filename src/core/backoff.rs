//! Randomized backoff between attempts of one cycle.

use rand::Rng;
use std::time::Duration;

use crate::config::PollingConfig;

/// Backoff window that grows linearly with the retry index.
///
/// Retry `n` (0-indexed) sleeps a uniformly random duration in
/// `[min_ms * (n + 1), max_ms * (n + 1))`, so both the delay and the width of
/// the window increase with every retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl BackoffPolicy {
    /// `min_ms` must be strictly below `max_ms`.
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        debug_assert!(min_ms < max_ms);
        Self { min_ms, max_ms }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.backoff_min_ms, config.backoff_max_ms)
    }

    /// Lower and upper bound of the window for `retry`.
    pub fn window(&self, retry: u32) -> (Duration, Duration) {
        let scale = u64::from(retry) + 1;
        (
            Duration::from_millis(self.min_ms.saturating_mul(scale)),
            Duration::from_millis(self.max_ms.saturating_mul(scale)),
        )
    }

    pub fn delay<R: Rng + ?Sized>(&self, retry: u32, rng: &mut R) -> Duration {
        let (low, high) = self.window(retry);
        let low_ms = low.as_millis() as u64;
        let high_ms = high.as_millis() as u64;
        if low_ms >= high_ms {
            return low;
        }
        Duration::from_millis(rng.random_range(low_ms..high_ms))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(5_000, 15_000)
    }
}
