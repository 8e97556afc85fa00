// Notification channel implementations
pub mod console;
pub mod email;
pub mod telegram;
pub mod webhook;

pub use console::ConsoleNotifier;
pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;
pub use webhook::WebhookNotifier;

use std::sync::Arc;
use tracing::{info, warn};

use super::traits::NotificationChannel;
use crate::config::NotificationsConfig;
use crate::utils::error::Result;

/// Builds every enabled channel. Channels that are enabled but missing
/// credentials are skipped with a warning instead of failing startup.
pub fn build_channels(config: &NotificationsConfig) -> Result<Vec<Arc<dyn NotificationChannel>>> {
    let mut channels: Vec<Arc<dyn NotificationChannel>> = Vec::new();

    if config.console.enabled {
        channels.push(Arc::new(ConsoleNotifier::new()));
    }

    if config.email.enabled {
        if config.email.is_complete() {
            channels.push(Arc::new(EmailNotifier::new(config.email.clone())));
        } else {
            warn!(channel = "email", "Email configuration incomplete - skipping email notifications");
        }
    }

    if config.webhook.enabled {
        if config.webhook.is_complete() {
            channels.push(Arc::new(WebhookNotifier::new(&config.webhook)?));
        } else {
            warn!(channel = "webhook", "Webhook URL missing - skipping webhook notifications");
        }
    }

    if config.telegram.enabled {
        if config.telegram.is_complete() {
            channels.push(Arc::new(TelegramNotifier::new(&config.telegram)?));
        } else {
            warn!(channel = "telegram", "Telegram bot token or chat id missing - skipping Telegram notifications");
        }
    }

    let names: Vec<_> = channels.iter().map(|c| c.channel_type()).collect();
    info!(channels = ?names, "Notification channels ready");

    Ok(channels)
}
