//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Task provider unreachable, rejected the request, or is not configured.
    SourceUnavailable(String),
    /// Language-model summarizer call failed or timed out.
    Summarizer(String),
    /// Email or Slack delivery failure.
    Notification(String),
    /// Document rendering failure.
    Render(String),
    /// Requested entity does not exist.
    NotFound(String),
    /// Caller supplied a malformed or incomplete request.
    InvalidRequest(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl AppError {
    /// Stable machine-readable identifier for this error kind.
    ///
    /// Used as the `kind` field of HTTP error bodies so callers can
    /// branch on the failure without parsing the message.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Db(_) => "persistence",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::Summarizer(_) => "summarizer",
            Self::Notification(_) => "notification",
            Self::Render(_) => "render",
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Io(_) => "io",
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::SourceUnavailable(msg) => write!(f, "task source unavailable: {msg}"),
            Self::Summarizer(msg) => write!(f, "summarizer: {msg}"),
            Self::Notification(msg) => write!(f, "notification: {msg}"),
            Self::Render(msg) => write!(f, "render: {msg}"),
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}
