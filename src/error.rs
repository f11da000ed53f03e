//! Error types for the metrics engine

use thiserror::Error;

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

/// Main error type for metrics operations
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Invalid declaration model: {0}")]
    InputShape(String),

    #[error("Type oracle failed comparing `{left}` with `{right}`: {message}")]
    Oracle {
        left: String,
        right: String,
        message: String,
    },

    #[error("Worker task rejected: {0}")]
    TaskRejected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl MetricsError {
    /// Create an input shape error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::InputShape(msg.into())
    }

    /// Create an oracle error for a pair of type expressions
    pub fn oracle(
        left: impl Into<String>,
        right: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Oracle {
            left: left.into(),
            right: right.into(),
            message: message.into(),
        }
    }

    /// Create a task rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::TaskRejected(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
