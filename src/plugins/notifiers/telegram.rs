use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::config::TelegramConfig;
use crate::models::{AdminAlert, NotificationEvent};
use crate::plugins::traits::NotificationChannel;
use crate::utils::error::{AppError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Bot API `sendMessage` to a single chat.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }

    async fn send_text(&self, text: String) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "disable_web_page_preview": false,
            }))
            .send()
            .await
            .map_err(|e| AppError::notification("telegram", e))?;

        let status = response.status();
        // The Bot API answers with {"ok": false, "description": ...} on failure.
        let body: Option<TelegramResponse> = response.json().await.ok();

        match body {
            Some(TelegramResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(TelegramResponse {
                description: Some(description),
                ..
            }) => Err(AppError::notification(
                "telegram",
                format!("HTTP {}: {}", status.as_u16(), description),
            )),
            _ => Err(AppError::notification(
                "telegram",
                format!("unexpected response (HTTP {})", status.as_u16()),
            )),
        }
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    fn channel_type(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        self.send_text(format!("{}\n\n{}", event.headline(), event.body()))
            .await?;
        info!(channel = "telegram", chat_id = %self.chat_id, "Telegram notification sent");
        Ok(())
    }

    async fn send_alert(&self, alert: &AdminAlert) -> Result<()> {
        self.send_text(format!("{}\n\n{}", alert.headline(), alert.body()))
            .await
    }
}
