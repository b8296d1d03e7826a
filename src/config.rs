//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::engine::classifier::MAX_RISK_WINDOW_DAYS;
use crate::{AppError, Result};

/// Keychain service name under which all secrets are stored.
pub const KEYRING_SERVICE: &str = "task-digest";

/// Notion database connection settings.
///
/// The integration token is loaded at runtime via OS keychain or the
/// `NOTION_API_KEY` environment variable, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Identifier of the Notion database holding the tasks.
    pub database_id: String,
    /// API base URL.
    #[serde(default = "default_notion_base_url")]
    pub base_url: String,
    /// Value sent in the `Notion-Version` header.
    #[serde(default = "default_notion_version")]
    pub api_version: String,
    /// Page size requested per database query round-trip.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Integration token (populated at runtime).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_notion_base_url() -> String {
    "https://api.notion.com/v1".into()
}

fn default_notion_version() -> String {
    "2022-06-28".into()
}

fn default_page_size() -> u32 {
    100
}

/// OpenAI-compatible chat-completions endpoint used for task summaries.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SummarizerConfig {
    /// API base URL (without the `/chat/completions` suffix).
    #[serde(default = "default_summarizer_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Bearer token (populated at runtime).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_summarizer_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}

fn default_model() -> String {
    "llama-3.1-70b-versatile".into()
}

fn default_temperature() -> f32 {
    0.6
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            base_url: default_summarizer_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

/// Timeout values (seconds) for outbound collaborator calls.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Task-source fetch timeout.
    #[serde(default = "default_source_seconds")]
    pub source_seconds: u64,
    /// Batch summarizer call timeout; also bounds opening a stream.
    #[serde(default = "default_summarizer_seconds")]
    pub summarizer_seconds: u64,
    /// Maximum silence between two streamed summary fragments.
    #[serde(default = "default_stream_idle_seconds")]
    pub stream_idle_seconds: u64,
    /// Notification delivery timeout.
    #[serde(default = "default_notify_seconds")]
    pub notify_seconds: u64,
}

fn default_source_seconds() -> u64 {
    20
}

fn default_summarizer_seconds() -> u64 {
    60
}

fn default_stream_idle_seconds() -> u64 {
    30
}

fn default_notify_seconds() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            source_seconds: default_source_seconds(),
            summarizer_seconds: default_summarizer_seconds(),
            stream_idle_seconds: default_stream_idle_seconds(),
            notify_seconds: default_notify_seconds(),
        }
    }
}

impl TimeoutConfig {
    /// Task-source fetch timeout as a [`Duration`].
    #[must_use]
    pub fn source(&self) -> Duration {
        Duration::from_secs(self.source_seconds)
    }

    /// Summarizer call timeout as a [`Duration`].
    #[must_use]
    pub fn summarizer(&self) -> Duration {
        Duration::from_secs(self.summarizer_seconds)
    }

    /// Streamed-fragment idle timeout as a [`Duration`].
    #[must_use]
    pub fn stream_idle(&self) -> Duration {
        Duration::from_secs(self.stream_idle_seconds)
    }

    /// Notification delivery timeout as a [`Duration`].
    #[must_use]
    pub fn notify(&self) -> Duration {
        Duration::from_secs(self.notify_seconds)
    }
}

/// Periodic background job configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerConfig {
    /// Whether the periodic jobs run at all.
    #[serde(default)]
    pub enabled: bool,
    /// Minutes between two ticks.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Owner recorded on scheduled reports.
    #[serde(default = "default_scheduler_owner")]
    pub owner_user: String,
    /// Addresses that receive every scheduled report.
    #[serde(default)]
    pub report_recipients: Vec<String>,
    /// Whether each tick also dispatches overdue alerts and at-risk reminders.
    #[serde(default)]
    pub send_deadline_alerts: bool,
}

fn default_interval_minutes() -> u64 {
    60
}

fn default_scheduler_owner() -> String {
    "scheduler".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_interval_minutes(),
            owner_user: default_scheduler_owner(),
            report_recipients: Vec::new(),
            send_deadline_alerts: false,
        }
    }
}

/// Notification transport selector.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotifyTransport {
    /// Notifications disabled.
    #[default]
    None,
    /// SMTP email.
    Email,
    /// Slack `chat.postMessage`.
    Slack,
}

/// SMTP relay settings. The password comes from keychain / `SMTP_PASSWORD`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SmtpConfig {
    /// Relay host name.
    #[serde(default = "default_smtp_host")]
    pub host: String,
    /// Relay port (STARTTLS).
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Sender address placed in the `From` header.
    pub from: String,
    /// Login user; defaults to `from` when omitted.
    #[serde(default)]
    pub username: Option<String>,
    /// Login password (populated at runtime).
    #[serde(skip)]
    pub password: Option<String>,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}

fn default_smtp_port() -> u16 {
    587
}

/// Slack settings. The bot token comes from keychain / `SLACK_BOT_TOKEN`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Bot user token used for posting messages (populated at runtime).
    #[serde(skip)]
    pub bot_token: String,
}

/// Notification routing configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct NotifyConfig {
    /// Which transport delivers notifications.
    #[serde(default)]
    pub transport: NotifyTransport,
    /// Fallback recipient for tasks without an assignee contact.
    #[serde(default)]
    pub default_recipient: Option<String>,
    /// SMTP relay, required when `transport = "email"`.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Slack settings, used when `transport = "slack"`.
    #[serde(default)]
    pub slack: SlackConfig,
}

fn default_http_port() -> u16 {
    8080
}

fn default_owner() -> String {
    "anonymous".into()
}

fn default_risk_window_days() -> u32 {
    2
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data").join("task-digest.db")
}

fn default_retention_days() -> u32 {
    90
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the API server.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Owner recorded on reports when the caller does not name one.
    #[serde(default = "default_owner")]
    pub default_owner: String,
    /// Days ahead of today that count as at-risk.
    #[serde(default = "default_risk_window_days")]
    pub risk_window_days: u32,
    /// `SQLite` database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    /// Days after which persisted reports are purged; 0 keeps them forever.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Task provider settings.
    pub source: SourceConfig,
    /// Summarizer settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    /// Outbound call timeouts.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Periodic job settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Notification settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load all secrets from OS keychain with env-var fallback.
    ///
    /// Missing secrets are not fatal: the collaborator that needs them
    /// reports itself unavailable at call time.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the keychain lookup task panics.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.source.api_key = load_credential("notion_api_key", "NOTION_API_KEY").await?;
        self.summarizer.api_key =
            load_credential("summarizer_api_key", "SUMMARIZER_API_KEY").await?;

        match self.notify.transport {
            NotifyTransport::Email => {
                let password = load_credential("smtp_password", "SMTP_PASSWORD").await?;
                if let Some(smtp) = self.notify.smtp.as_mut() {
                    smtp.password = password;
                }
            }
            NotifyTransport::Slack => {
                self.notify.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN")
                    .await?
                    .unwrap_or_default();
            }
            NotifyTransport::None => {}
        }
        Ok(())
    }

    /// Scheduler tick interval as a [`Duration`].
    #[must_use]
    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_minutes.saturating_mul(60))
    }

    fn validate(&self) -> Result<()> {
        if self.source.database_id.trim().is_empty() {
            return Err(AppError::Config(
                "source.database_id must not be empty".into(),
            ));
        }

        if self.source.page_size == 0 || self.source.page_size > 100 {
            return Err(AppError::Config(
                "source.page_size must be between 1 and 100".into(),
            ));
        }

        if self.risk_window_days > MAX_RISK_WINDOW_DAYS {
            return Err(AppError::Config(format!(
                "risk_window_days must be at most {MAX_RISK_WINDOW_DAYS}"
            )));
        }

        if self.scheduler.enabled && self.scheduler.interval_minutes == 0 {
            return Err(AppError::Config(
                "scheduler.interval_minutes must be greater than zero".into(),
            ));
        }

        let timeouts = &self.timeouts;
        if timeouts.source_seconds == 0
            || timeouts.summarizer_seconds == 0
            || timeouts.stream_idle_seconds == 0
            || timeouts.notify_seconds == 0
        {
            return Err(AppError::Config("timeouts must be greater than zero".into()));
        }

        if self.notify.transport == NotifyTransport::Email && self.notify.smtp.is_none() {
            return Err(AppError::Config(
                "notify.smtp is required when notify.transport = \"email\"".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
///
/// Returns `Ok(None)` when neither source provides a non-empty value.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<Option<String>> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(Some(value)),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            tracing::debug!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.is_empty() => Ok(Some(value)),
        _ => {
            warn!(
                key = keyring_key,
                env = env_key,
                "credential not found in keychain or environment"
            );
            Ok(None)
        }
    }
}
