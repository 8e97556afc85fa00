use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{AttemptClassifier, BackoffPolicy, ProfileRotator};
use crate::alerts::{AlertSink, LogAlertSink};
use crate::config::{PollingConfig, TargetConfig};
use crate::fetcher::PageFetcher;
use crate::models::{
    AdminAlert, AlertKind, AttemptOutcome, CycleOutcome, ExhaustionReason, PollCycleResult,
};

/// Runs one poll cycle: fetch, classify, and either stop or back off and retry.
///
/// Only blocked and transient outcomes are retried. A cycle makes at most
/// `max_attempts` fetches. The profile rotator is owned here so its cursors
/// carry over from one cycle to the next.
pub struct RetryController {
    fetcher: Arc<dyn PageFetcher>,
    classifier: AttemptClassifier,
    rotator: ProfileRotator,
    backoff: BackoffPolicy,
    rng: StdRng,
    alerts: Arc<dyn AlertSink>,
    target_url: String,
    max_attempts: u32,
    cancel: CancellationToken,
}

impl RetryController {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        rotator: ProfileRotator,
        target: &TargetConfig,
        polling: &PollingConfig,
    ) -> Self {
        let rng = match polling.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };

        Self {
            fetcher,
            classifier: AttemptClassifier::new(&target.name),
            rotator,
            backoff: BackoffPolicy::from_config(polling),
            rng,
            alerts: Arc::new(LogAlertSink),
            target_url: target.url.clone(),
            max_attempts: polling.max_retries_per_cycle.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn target_name(&self) -> &str {
        self.classifier.target_name()
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub async fn run_cycle(&mut self) -> PollCycleResult {
        let mut attempts_made = 0;
        let mut retry = 0;

        loop {
            if self.cancel.is_cancelled() {
                info!(attempts = attempts_made, "Cycle cancelled before next attempt");
                return cycle_result(CycleOutcome::Cancelled, attempts_made);
            }

            let profile = self.rotator.next_profile(retry);
            info!(
                attempt = retry + 1,
                max_attempts = self.max_attempts,
                fetcher = self.fetcher.name(),
                viewport = %profile.viewport,
                "Checking {} for '{}'",
                self.target_url,
                self.target_name()
            );
            debug!(user_agent = %profile.user_agent, "Using fetch profile");

            let fetch_result = self.fetcher.fetch(&self.target_url, &profile).await;
            attempts_made += 1;

            let outcome = self.classifier.classify(fetch_result);
            let label = outcome.label();

            match outcome {
                AttemptOutcome::Found {
                    listing_titles,
                    matched_title,
                } => {
                    info!(
                        attempt = attempts_made,
                        listings = listing_titles.len(),
                        "🎉 '{}' is available as '{}'",
                        self.target_name(),
                        matched_title
                    );
                    return cycle_result(
                        CycleOutcome::Success {
                            matched_title,
                            listing_titles,
                        },
                        attempts_made,
                    );
                }
                AttemptOutcome::NotFound { listing_titles } => {
                    info!(
                        listings = listing_titles.len(),
                        "'{}' not listed yet",
                        self.target_name()
                    );
                    debug!(titles = ?listing_titles, "Current listing");
                    return cycle_result(
                        CycleOutcome::Exhausted(ExhaustionReason::NoMatch),
                        attempts_made,
                    );
                }
                AttemptOutcome::FatalError { raw_error } => {
                    error!(attempt = attempts_made, error = %raw_error, "Attempt failed and cannot be retried");
                    return cycle_result(
                        CycleOutcome::Exhausted(ExhaustionReason::Error { message: raw_error }),
                        attempts_made,
                    );
                }
                AttemptOutcome::Blocked { raw_error }
                | AttemptOutcome::TransientError { raw_error } => {
                    warn!(retry, outcome = label, error = %raw_error, "Attempt failed");

                    if retry + 1 >= self.max_attempts {
                        self.raise_alert(AlertKind::RetriesExhausted, &raw_error, retry)
                            .await;
                        error!(attempts = attempts_made, "All retry attempts exhausted");
                        return cycle_result(
                            CycleOutcome::Exhausted(ExhaustionReason::RetriesSpent {
                                last_error: raw_error,
                            }),
                            attempts_made,
                        );
                    }

                    if retry == 0 {
                        self.raise_alert(AlertKind::FirstFailure, &raw_error, retry).await;
                    }

                    let delay = self.backoff.delay(retry, &mut self.rng);
                    info!(
                        retry = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Backing off before retry"
                    );
                    if !self.sleep_unless_cancelled(delay).await {
                        info!(attempts = attempts_made, "Cycle cancelled during backoff");
                        return cycle_result(CycleOutcome::Cancelled, attempts_made);
                    }

                    retry += 1;
                }
            }
        }
    }

    async fn raise_alert(&self, kind: AlertKind, error: &str, retry: u32) {
        let alert = AdminAlert::new(kind, error, retry, self.target_name(), &self.target_url);
        self.alerts.alert(&alert).await;
    }

    /// Returns false when cancelled before the delay elapsed.
    async fn sleep_unless_cancelled(&self, delay: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

fn cycle_result(outcome: CycleOutcome, attempts_made: u32) -> PollCycleResult {
    PollCycleResult {
        outcome,
        attempts_made,
    }
}
