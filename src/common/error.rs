//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}")]
    #[allow(dead_code)]
    MissingVar { var: String },

    #[error("Invalid value for '{var}': {message}")]
    #[allow(dead_code)]
    InvalidValue { var: String, message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Session store errors.
///
/// Load failures never surface as errors (an unreadable store means
/// "no prior session"); only writes are fallible.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to write session file '{path}': {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize credentials: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Target transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to gateway '{url}': {message}")]
    ConnectFailed { url: String, message: String },

    #[error("Failed to send message: {message}")]
    SendFailed { message: String },

    #[error("Malformed gateway frame: {message}")]
    InvalidFrame { message: String },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for session store operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;
