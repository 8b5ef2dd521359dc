//! Error types for the monitor

use thiserror::Error;

/// Monitor-wide error type
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown coin: {0}")]
    UnknownCoin(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MonitorError {
    pub fn config(msg: impl Into<String>) -> Self {
        MonitorError::Config(msg.into())
    }

    pub fn unknown_coin(id: impl Into<String>) -> Self {
        MonitorError::UnknownCoin(id.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        MonitorError::Internal(msg.into())
    }
}

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;
