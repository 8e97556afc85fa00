use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use url::Url;

pub const DEFAULT_TARGET_URL: &str =
    "https://in.bookmyshow.com/explore/movies-bengaluru?languages=tamil";
pub const DEFAULT_LISTING_SELECTOR: &str = "div.sc-7o7nez-0.elfplV";
pub const CHANNEL_NAMES: [&str; 4] = ["console", "email", "webhook", "telegram"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub polling: PollingConfig,
    pub notifications: NotificationsConfig,
    pub admin_alerts: AdminAlertConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    Browser,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub url: String,
    pub name: String,
    pub listing_selector: String,
    pub fetcher: FetcherKind,
    pub request_timeout_secs: u64,
    pub chrome_path: Option<String>,
    pub proxy: Option<String>,
    pub interaction_delay_min_ms: u64,
    pub interaction_delay_max_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub poll_interval_seconds: u64,
    /// Total attempts allowed in one cycle, the first one included.
    pub max_retries_per_cycle: u32,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
    pub random_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    pub console: ConsoleConfig,
    pub email: EmailConfig,
    pub webhook: WebhookConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub sender_email: String,
    pub sender_password: String,
    pub recipient_emails: Vec<String>,
}

impl EmailConfig {
    pub fn is_complete(&self) -> bool {
        !self.smtp_server.is_empty()
            && !self.sender_email.is_empty()
            && !self.sender_password.is_empty()
            && !self.recipient_emails.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

impl WebhookConfig {
    pub fn is_complete(&self) -> bool {
        Url::parse(&self.url).is_ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    pub api_base: String,
}

impl TelegramConfig {
    pub fn is_complete(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminAlertConfig {
    pub enabled: bool,
    /// Names of notification channels that also carry admin alerts.
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl AppConfig {
    /// Loads defaults, then the optional file at `path`, then the process
    /// environment.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Same as [`AppConfig::load`] but reads environment variables from
    /// `env_vars` instead of the process environment when given.
    pub fn load_with_env(
        path: &str,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| -> Option<String> {
            let value = match &env_vars {
                Some(vars) => vars.get(key).cloned(),
                None => env::var(key).ok(),
            };
            value.filter(|v| !v.trim().is_empty())
        };

        let builder = Self::with_defaults(Config::builder())?
            .add_source(File::with_name(path).required(false))
            // SHOWTIME__POLLING__MAX_RETRIES_PER_CYCLE=5 and friends
            .add_source(
                Environment::with_prefix("SHOWTIME")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("notifications.email.recipient_emails")
                    .with_list_parse_key("admin_alerts.channels")
                    .try_parsing(true)
                    .source(env_vars.clone()),
            );

        let config: AppConfig = Self::with_legacy_env(builder, lookup)?
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("target.url", DEFAULT_TARGET_URL)?
            .set_default("target.name", "Coolie")?
            .set_default("target.listing_selector", DEFAULT_LISTING_SELECTOR)?
            .set_default("target.fetcher", "browser")?
            .set_default("target.request_timeout_secs", 30)?
            .set_default("target.interaction_delay_min_ms", 300)?
            .set_default("target.interaction_delay_max_ms", 900)?
            .set_default("polling.poll_interval_seconds", 300)?
            .set_default("polling.max_retries_per_cycle", 3)?
            .set_default("polling.backoff_min_ms", 5000)?
            .set_default("polling.backoff_max_ms", 15000)?
            .set_default("notifications.console.enabled", true)?
            .set_default("notifications.email.enabled", false)?
            .set_default("notifications.email.smtp_server", "smtp.gmail.com")?
            .set_default("notifications.email.smtp_port", 587)?
            .set_default("notifications.email.sender_email", "")?
            .set_default("notifications.email.sender_password", "")?
            .set_default("notifications.email.recipient_emails", Vec::<String>::new())?
            .set_default("notifications.webhook.enabled", false)?
            .set_default("notifications.webhook.url", "")?
            .set_default("notifications.webhook.timeout_secs", 10)?
            .set_default("notifications.telegram.enabled", false)?
            .set_default("notifications.telegram.bot_token", "")?
            .set_default("notifications.telegram.chat_id", "")?
            .set_default("notifications.telegram.api_base", "https://api.telegram.org")?
            .set_default("admin_alerts.enabled", false)?
            .set_default("admin_alerts.channels", Vec::<String>::new())?
            .set_default("logging.level", "info")
    }

    /// Variables understood by the original monitoring script. They take
    /// precedence over everything else.
    fn with_legacy_env(
        builder: ConfigBuilder<DefaultState>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let webhook_url = lookup("WEBHOOK_URL");
        let telegram_token = lookup("TELEGRAM_BOT_TOKEN");

        builder
            .set_override_option("target.url", lookup("TARGET_URL"))?
            .set_override_option("target.name", lookup("MOVIE_NAME"))?
            .set_override_option("polling.poll_interval_seconds", lookup("CHECK_INTERVAL"))?
            .set_override_option(
                "notifications.webhook.enabled",
                webhook_url.as_ref().map(|_| true),
            )?
            .set_override_option("notifications.webhook.url", webhook_url)?
            .set_override_option("notifications.email.sender_email", lookup("SENDER_EMAIL"))?
            .set_override_option(
                "notifications.email.sender_password",
                lookup("SENDER_PASSWORD"),
            )?
            .set_override_option(
                "notifications.email.recipient_emails",
                lookup("RECIPIENT_EMAILS").map(|v| parse_recipient_emails(&v)),
            )?
            .set_override_option(
                "notifications.telegram.enabled",
                telegram_token.as_ref().map(|_| true),
            )?
            .set_override_option("notifications.telegram.bot_token", telegram_token)?
            .set_override_option("notifications.telegram.chat_id", lookup("TELEGRAM_CHAT_ID"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Target
        if Url::parse(&self.target.url).is_err() {
            return Err(ConfigError::Message("Invalid target URL format".into()));
        }

        if self.target.name.trim().is_empty() {
            return Err(ConfigError::Message("Target name must not be empty".into()));
        }

        if scraper::Selector::parse(&self.target.listing_selector).is_err() {
            return Err(ConfigError::Message(format!(
                "Invalid listing selector '{}'",
                self.target.listing_selector
            )));
        }

        if self.target.request_timeout_secs == 0 {
            return Err(ConfigError::Message("Request timeout must be greater than 0".into()));
        }

        if self.target.interaction_delay_min_ms > self.target.interaction_delay_max_ms {
            return Err(ConfigError::Message(
                "interaction_delay_min_ms cannot exceed interaction_delay_max_ms".into(),
            ));
        }

        // Polling
        if self.polling.poll_interval_seconds == 0 {
            return Err(ConfigError::Message("Poll interval must be greater than 0".into()));
        }

        if !(1..=10).contains(&self.polling.max_retries_per_cycle) {
            return Err(ConfigError::Message(
                "max_retries_per_cycle must be between 1 and 10".into(),
            ));
        }

        if self.polling.backoff_min_ms >= self.polling.backoff_max_ms {
            return Err(ConfigError::Message(
                "backoff_min_ms must be less than backoff_max_ms".into(),
            ));
        }

        // Notifications
        if self.notifications.email.smtp_port == 0 {
            return Err(ConfigError::Message("SMTP port must be greater than 0".into()));
        }

        if self.notifications.webhook.timeout_secs == 0 {
            return Err(ConfigError::Message("Webhook timeout must be greater than 0".into()));
        }

        if let Some(unknown) = self
            .admin_alerts
            .channels
            .iter()
            .find(|name| !CHANNEL_NAMES.contains(&name.as_str()))
        {
            return Err(ConfigError::Message(format!(
                "Unknown admin alert channel '{}'",
                unknown
            )));
        }

        Ok(())
    }
}

/// Splits a comma separated address list, dropping blanks.
pub fn parse_recipient_emails(emails: &str) -> Vec<String> {
    emails
        .split(',')
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect()
}
