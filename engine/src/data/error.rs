//! Error types for the storage and telemetry collaborators

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Transport-level failure (connect, timeout, body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Storage backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Every retry attempt failed
    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("Storage configuration error: {0}")]
    Config(String),

    /// Event failed its own validation and was not sent
    #[error("Invalid decision event: {0}")]
    InvalidEvent(String),
}

impl StorageError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Network failures, 5xx and 429 are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Telemetry channel closed")]
    ChannelClosed,

    #[error("Telemetry buffer full")]
    BufferFull,

    #[error("Telemetry sink error: {0}")]
    Sink(String),
}
