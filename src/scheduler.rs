use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::PollingConfig;
use crate::core::RetryController;
use crate::models::{CycleOutcome, ExhaustionReason, NotificationEvent, PollCycleResult};
use crate::plugins::{DispatchReport, NotificationDispatcher};

/// How a run of the scheduler ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The target was found and the notification dispatched.
    Found {
        event: NotificationEvent,
        report: DispatchReport,
        cycles: u32,
    },
    /// Single-run mode only: the cycle ended without a match.
    NotFound {
        cycles: u32,
        last_result: PollCycleResult,
    },
    Cancelled { cycles: u32 },
}

impl RunOutcome {
    /// Process exit status for the run. Channel failures do not change the
    /// status of a found run.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Found { .. } => 0,
            RunOutcome::NotFound { .. } => 1,
            RunOutcome::Cancelled { .. } => 130,
        }
    }

    pub fn cycles(&self) -> u32 {
        match self {
            RunOutcome::Found { cycles, .. }
            | RunOutcome::NotFound { cycles, .. }
            | RunOutcome::Cancelled { cycles } => *cycles,
        }
    }
}

/// Outer loop: one cycle per interval until the target shows up.
pub struct PollScheduler {
    controller: RetryController,
    dispatcher: NotificationDispatcher,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl PollScheduler {
    /// Cancellation follows the controller's token.
    pub fn new(
        controller: RetryController,
        dispatcher: NotificationDispatcher,
        polling: &PollingConfig,
    ) -> Self {
        let cancel = controller.cancellation_token();
        Self {
            controller,
            dispatcher,
            poll_interval: Duration::from_secs(polling.poll_interval_seconds),
            cancel,
        }
    }

    /// Polls until the target is found or the run is cancelled. The
    /// notification is dispatched at most once.
    pub async fn run(&mut self) -> RunOutcome {
        info!(
            movie = self.controller.target_name(),
            interval_secs = self.poll_interval.as_secs(),
            "Starting movie monitor"
        );

        let mut cycles = 0;
        loop {
            cycles += 1;
            info!(cycle = cycles, "Checking movie availability...");

            let result = self.controller.run_cycle().await;
            match result.outcome {
                CycleOutcome::Success { matched_title, .. } => {
                    info!("Movie found - stopping monitor");
                    return self.notify(&matched_title, cycles).await;
                }
                CycleOutcome::Cancelled => {
                    info!(cycles, "Movie monitor stopped by user");
                    return RunOutcome::Cancelled { cycles };
                }
                CycleOutcome::Exhausted(reason) => log_exhaustion(cycles, &reason),
            }

            info!(
                wait_secs = self.poll_interval.as_secs(),
                "Movie not found - waiting for next check"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!(cycles, "Movie monitor stopped by user");
                    return RunOutcome::Cancelled { cycles };
                }
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Runs exactly one cycle, for cron style invocation.
    pub async fn run_once(&mut self) -> RunOutcome {
        info!(movie = self.controller.target_name(), "Running single check");

        let result = self.controller.run_cycle().await;
        match &result.outcome {
            CycleOutcome::Success { matched_title, .. } => {
                return self.notify(matched_title, 1).await;
            }
            CycleOutcome::Cancelled => return RunOutcome::Cancelled { cycles: 1 },
            CycleOutcome::Exhausted(reason) => log_exhaustion(1, reason),
        }

        RunOutcome::NotFound {
            cycles: 1,
            last_result: result,
        }
    }

    async fn notify(&self, matched_title: &str, cycles: u32) -> RunOutcome {
        let event = NotificationEvent::new(
            self.controller.target_name(),
            matched_title,
            self.controller.target_url(),
        );
        let report = self.dispatcher.dispatch(&event).await;

        RunOutcome::Found {
            event,
            report,
            cycles,
        }
    }
}

fn log_exhaustion(cycle: u32, reason: &ExhaustionReason) {
    match reason {
        ExhaustionReason::NoMatch => info!(cycle, "Movie not listed in this cycle"),
        ExhaustionReason::Error { message } => {
            warn!(cycle, error = %message, "Cycle ended on an unrecoverable fetch error")
        }
        ExhaustionReason::RetriesSpent { last_error } => {
            warn!(cycle, error = %last_error, "Cycle ended after exhausting retries")
        }
    }
}
