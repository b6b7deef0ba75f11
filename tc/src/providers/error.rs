//! Provider error types

use std::time::Duration;
use thiserror::Error;

/// Errors returned by directions, geocoding and weather providers
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{service} returned status {status}: {message}")]
    Status {
        service: &'static str,
        status: String,
        message: String,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Map a reqwest failure, reporting client-side timeouts as [`ProviderError::Timeout`]
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(timeout)
        } else if err.is_decode() {
            ProviderError::InvalidResponse(err.to_string())
        } else {
            ProviderError::Network(err)
        }
    }
}
