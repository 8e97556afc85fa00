use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::info;

use crate::config::WebhookConfig;
use crate::models::{AdminAlert, NotificationEvent};
use crate::plugins::traits::NotificationChannel;
use crate::utils::error::{AppError, Result};

/// JSON POST to a Discord/Slack style incoming webhook.
///
/// The `content` field carries the rendered message; the remaining fields are
/// structured copies for receivers that parse the payload.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    fn create_event_payload(&self, event: &NotificationEvent) -> Value {
        json!({
            "content": format!(
                "🎬 **Movie Alert!** \n\nThe movie **{}** is now available for booking!\n\nBook here: {}",
                event.movie_name, event.target_url
            ),
            "event": "movie_available",
            "id": event.id,
            "movie_name": event.movie_name,
            "matched_title": event.matched_title,
            "url": event.target_url,
            "timestamp": event.occurred_at.to_rfc3339(),
        })
    }

    fn create_alert_payload(&self, alert: &AdminAlert) -> Value {
        json!({
            "content": format!("**{}**\n\n{}", alert.headline(), alert.body()),
            "event": "admin_alert",
            "kind": alert.kind,
            "error": alert.error,
            "retry_index": alert.retry_index,
            "movie_name": alert.target_name,
            "url": alert.target_url,
            "timestamp": alert.occurred_at.to_rfc3339(),
        })
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        self.client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AppError::notification("webhook", e))?;
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for WebhookNotifier {
    fn channel_type(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        self.post(&self.create_event_payload(event)).await?;
        info!(channel = "webhook", "Webhook notification sent successfully");
        Ok(())
    }

    async fn send_alert(&self, alert: &AdminAlert) -> Result<()> {
        self.post(&self.create_alert_payload(alert)).await
    }
}
