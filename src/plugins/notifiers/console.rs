use async_trait::async_trait;
use tracing::info;

use crate::models::{AdminAlert, NotificationEvent};
use crate::plugins::traits::NotificationChannel;
use crate::utils::error::Result;

const RULE_WIDTH: usize = 60;

/// Prints a banner to stdout. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        ConsoleNotifier
    }

    fn format_banner(&self, event: &NotificationEvent) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        format!(
            "\n{rule}\n🎬 MOVIE ALERT: {} IS AVAILABLE!\nListed as: {}\nBook your tickets at: {}\nTime: {}\n{rule}\n",
            event.movie_name.to_uppercase(),
            event.matched_title,
            event.target_url,
            event.occurred_at.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    fn format_alert(&self, alert: &AdminAlert) -> String {
        format!("{}\n{}", alert.headline(), alert.body())
    }
}

#[async_trait]
impl NotificationChannel for ConsoleNotifier {
    fn channel_type(&self) -> &'static str {
        "console"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        println!("{}", self.format_banner(event));
        info!(channel = "console", "Console notification printed");
        Ok(())
    }

    async fn send_alert(&self, alert: &AdminAlert) -> Result<()> {
        eprintln!("{}", self.format_alert(alert));
        Ok(())
    }
}
