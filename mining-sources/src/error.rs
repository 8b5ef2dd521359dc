//! Error types for the source adapters

use thiserror::Error;

/// Why a single adapter call failed.
///
/// These never escape the fallback resolver; they are logged and the next
/// candidate is tried.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Provider answered with a non-2xx status
    #[error("HTTP error: {0}")]
    Http(u16),

    /// Payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Payload decoded but lacked a required value
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// This adapter has no mapping for the coin
    #[error("Unsupported coin: {0}")]
    Unsupported(String),

    /// HTTP client could not be built
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            SourceError::Http(status.as_u16())
        } else if e.is_decode() {
            SourceError::Parse(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}
