use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{error, info};

use crate::config::EmailConfig;
use crate::models::{AdminAlert, NotificationEvent};
use crate::plugins::traits::NotificationChannel;
use crate::utils::error::{AppError, Result};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP with STARTTLS, one message per recipient.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn format_event_body(&self, event: &NotificationEvent) -> String {
        format!("{}\n\nMovie Monitor Alert", event.body())
    }

    fn build_message(&self, recipient: &str, subject: &str, body: String) -> Result<Message> {
        let from: Mailbox = self
            .config
            .sender_email
            .parse()
            .map_err(|e| AppError::notification("email", format!("invalid sender address: {}", e)))?;
        let to: Mailbox = recipient.parse().map_err(|e| {
            AppError::notification("email", format!("invalid recipient '{}': {}", recipient, e))
        })?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::notification("email", e))
    }

    fn build_transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let credentials = Credentials::new(
            self.config.sender_email.clone(),
            self.config.sender_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_server)
            .map_err(|e| AppError::notification("email", e))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(transport)
    }

    /// Messages are built up front so an address problem fails before any
    /// connection is made. Every recipient is attempted.
    async fn deliver(&self, subject: &str, body: &str) -> Result<()> {
        let messages = self
            .config
            .recipient_emails
            .iter()
            .map(|recipient| {
                self.build_message(recipient, subject, body.to_string())
                    .map(|message| (recipient.as_str(), message))
            })
            .collect::<Result<Vec<_>>>()?;

        let mailer = self.build_transport()?;
        let mut failures = Vec::new();

        for (recipient, message) in messages {
            match mailer.send(message).await {
                Ok(_) => info!(channel = "email", recipient, "Email notification sent"),
                Err(e) => {
                    error!(channel = "email", recipient, error = %e, "Failed to send email");
                    failures.push(format!("{}: {}", recipient, e));
                }
            }
        }

        if failures.is_empty() {
            info!(
                channel = "email",
                recipients = self.config.recipient_emails.len(),
                "Email notifications sent"
            );
            Ok(())
        } else {
            Err(AppError::notification(
                "email",
                format!(
                    "delivery failed for {} of {} recipients ({})",
                    failures.len(),
                    self.config.recipient_emails.len(),
                    failures.join("; ")
                ),
            ))
        }
    }
}

#[async_trait]
impl NotificationChannel for EmailNotifier {
    fn channel_type(&self) -> &'static str {
        "email"
    }

    async fn send(&self, event: &NotificationEvent) -> Result<()> {
        self.deliver(&event.headline(), &self.format_event_body(event)).await
    }

    async fn send_alert(&self, alert: &AdminAlert) -> Result<()> {
        self.deliver(&alert.headline(), &alert.body()).await
    }
}
