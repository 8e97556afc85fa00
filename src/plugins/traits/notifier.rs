use async_trait::async_trait;

use crate::models::{AdminAlert, NotificationEvent};
use crate::utils::error::Result;

/// A delivery channel for the availability notice and for admin alerts.
///
/// Credentials and endpoints are owned by the channel and taken from config
/// when it is built. A failed delivery is reported through the returned error
/// and never retried by the channel itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Short identifier, matching the config section name.
    fn channel_type(&self) -> &'static str;

    async fn send(&self, event: &NotificationEvent) -> Result<()>;

    async fn send_alert(&self, alert: &AdminAlert) -> Result<()>;
}
