//! Admin side channel for blocking and fetch trouble.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AdminAlertConfig;
use crate::models::AdminAlert;
use crate::plugins::NotificationChannel;

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Delivery is best effort; nothing is reported back to the caller.
    async fn alert(&self, alert: &AdminAlert);
}

/// Writes alerts to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn alert(&self, alert: &AdminAlert) {
        log_alert(alert);
    }
}

/// Logs the alert, then forwards it to every configured channel.
pub struct ChannelAlertSink {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl ChannelAlertSink {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl AlertSink for ChannelAlertSink {
    async fn alert(&self, alert: &AdminAlert) {
        log_alert(alert);

        for channel in &self.channels {
            match channel.send_alert(alert).await {
                Ok(()) => info!(channel = channel.channel_type(), "Admin alert delivered"),
                Err(e) => warn!(
                    channel = channel.channel_type(),
                    error = %e,
                    "Failed to deliver admin alert"
                ),
            }
        }
    }
}

fn log_alert(alert: &AdminAlert) {
    warn!(
        kind = %alert.kind,
        retry = alert.retry_index,
        error = %alert.error,
        "{}",
        alert.headline()
    );
}

/// Picks the sink for the run: channel delivery when admin alerts are enabled
/// and at least one of the named channels was built, the log otherwise.
pub fn build_alert_sink(
    config: &AdminAlertConfig,
    channels: &[Arc<dyn NotificationChannel>],
) -> Arc<dyn AlertSink> {
    if !config.enabled {
        return Arc::new(LogAlertSink);
    }

    let selected: Vec<_> = channels
        .iter()
        .filter(|channel| config.channels.iter().any(|name| name == channel.channel_type()))
        .cloned()
        .collect();

    if selected.is_empty() {
        warn!("Admin alerts enabled but none of the configured channels are available; alerts go to the log only");
        return Arc::new(LogAlertSink);
    }

    Arc::new(ChannelAlertSink::new(selected))
}
