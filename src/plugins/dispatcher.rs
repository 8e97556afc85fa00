use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::traits::NotificationChannel;
use crate::models::NotificationEvent;

/// Result of one channel's delivery attempt.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: String,
    pub error: Option<String>,
}

impl ChannelOutcome {
    pub fn delivered(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-channel results of a dispatch, in channel order.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl DispatchReport {
    pub fn delivered(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.delivered())
            .map(|o| o.channel.as_str())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ChannelOutcome> {
        self.outcomes.iter().filter(|o| !o.delivered())
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered().count()
    }

    pub fn all_delivered(&self) -> bool {
        self.outcomes.iter().all(ChannelOutcome::delivered)
    }
}

/// Fans a [`NotificationEvent`] out to every enabled channel.
///
/// Channels run one after another. Each is invoked exactly once and its
/// failure is logged and recorded without affecting the others.
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationDispatcher {
    pub fn new(channels: Vec<Arc<dyn NotificationChannel>>) -> Self {
        Self { channels }
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.channel_type()).collect()
    }

    pub async fn dispatch(&self, event: &NotificationEvent) -> DispatchReport {
        info!(
            movie = %event.movie_name,
            matched_title = %event.matched_title,
            channels = self.channels.len(),
            "🎉 MOVIE FOUND: dispatching notifications"
        );

        if self.channels.is_empty() {
            warn!("No notification channels enabled; nothing was sent");
        }

        let mut report = DispatchReport::default();

        for channel in &self.channels {
            let name = channel.channel_type();
            let error = match channel.send(event).await {
                Ok(()) => None,
                Err(e) => {
                    error!(channel = name, error = %e, "Failed to send notification");
                    Some(e.to_string())
                }
            };
            report.outcomes.push(ChannelOutcome {
                channel: name.to_string(),
                error,
            });
        }

        info!(
            delivered = report.delivered_count(),
            failed = report.outcomes.len() - report.delivered_count(),
            "Notification dispatch finished"
        );

        report
    }
}
