// Shared fixtures for the integration tests: scripted fetchers and recording
// sinks/channels stand in for the browser and the real delivery endpoints.

pub mod cycle_scenario_tests;
pub mod end_to_end_tests;
pub mod scheduler_tests;

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use showtime_watcher::{
    AppConfig, AppError, PollScheduler, RunOutcome,
    alerts::AlertSink,
    core::{ProfileRotator, RetryController},
    fetcher::{FetchError, FetchErrorKind, PageFetcher},
    models::{AdminAlert, FetchProfile, NotificationEvent},
    plugins::{NotificationChannel, NotificationDispatcher},
};

pub type Scripted = Result<Vec<String>, FetchError>;

pub fn titles(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn fetch_error(kind: FetchErrorKind, message: &str) -> Scripted {
    Err(FetchError::new(kind, message))
}

/// Plays back a fixed list of fetch results, one per call.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Scripted>>,
    profiles: Mutex<Vec<FetchProfile>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            profiles: Mutex::new(Vec::new()),
            cancel_after: Mutex::new(None),
        })
    }

    /// Cancels `token` during the `call`-th fetch (1-based).
    pub fn cancel_on_call(&self, call: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((call, token));
    }

    pub fn calls(&self) -> usize {
        self.profiles.lock().unwrap().len()
    }

    pub fn profiles(&self) -> Vec<FetchProfile> {
        self.profiles.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch(&self, _url: &str, profile: &FetchProfile) -> Result<Vec<String>, FetchError> {
        let call = {
            let mut profiles = self.profiles.lock().unwrap();
            profiles.push(profile.clone());
            profiles.len()
        };

        if let Some((cancel_call, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if *cancel_call == call {
                token.cancel();
            }
        }

        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Default)]
pub struct RecordingAlertSink {
    pub alerts: Mutex<Vec<AdminAlert>>,
}

impl RecordingAlertSink {
    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn alert(&self, alert: &AdminAlert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

/// Records every delivery; optionally fails each one.
pub struct RecordingChannel {
    name: &'static str,
    fail: bool,
    pub events: Mutex<Vec<NotificationEvent>>,
    pub alerts: Mutex<Vec<AdminAlert>>,
}

impl RecordingChannel {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail: false,
            events: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail: true,
            events: Mutex::new(Vec::new()),
            alerts: Mutex::new(Vec::new()),
        })
    }

    pub fn sends(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn channel_type(&self) -> &'static str {
        self.name
    }

    async fn send(&self, event: &NotificationEvent) -> showtime_watcher::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        if self.fail {
            return Err(AppError::notification(self.name, "simulated outage"));
        }
        Ok(())
    }

    async fn send_alert(&self, alert: &AdminAlert) -> showtime_watcher::Result<()> {
        self.alerts.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(AppError::notification(self.name, "simulated outage"));
        }
        Ok(())
    }
}

/// Defaults with no config file and an empty environment.
pub fn get_test_config(target_name: &str, max_attempts: u32) -> AppConfig {
    let mut env = HashMap::new();
    env.insert("MOVIE_NAME".to_string(), target_name.to_string());
    env.insert(
        "SHOWTIME__POLLING__MAX_RETRIES_PER_CYCLE".to_string(),
        max_attempts.to_string(),
    );
    env.insert("SHOWTIME__POLLING__RANDOM_SEED".to_string(), "7".to_string());
    env.insert("SHOWTIME__TARGET__FETCHER".to_string(), "http".to_string());

    AppConfig::load_with_env("tests/fixtures/does-not-exist", Some(env))
        .expect("test configuration should load")
}

pub fn create_controller(
    config: &AppConfig,
    fetcher: Arc<ScriptedFetcher>,
    alerts: Arc<RecordingAlertSink>,
    cancel: CancellationToken,
) -> RetryController {
    RetryController::new(
        fetcher,
        ProfileRotator::new(config.polling.random_seed),
        &config.target,
        &config.polling,
    )
    .with_alert_sink(alerts)
    .with_cancellation(cancel)
}

pub fn create_scheduler(
    config: &AppConfig,
    fetcher: Arc<ScriptedFetcher>,
    alerts: Arc<RecordingAlertSink>,
    channels: Vec<Arc<dyn NotificationChannel>>,
    cancel: CancellationToken,
) -> PollScheduler {
    let controller = create_controller(config, fetcher, alerts, cancel);
    PollScheduler::new(
        controller,
        NotificationDispatcher::new(channels),
        &config.polling,
    )
}
