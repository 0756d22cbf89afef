//! Error types for upstream lookups
//!
//! These never cross the public check operations: clients log them and
//! degrade to an absent result, which the resolver maps to `unknown`.

use thiserror::Error;

/// Failure of a single upstream lookup
#[derive(Debug, Error)]
pub enum FetchError {
    /// DNS, connect, timeout or body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 429 persisted through every retry
    #[error("Rate limited after {0} attempts")]
    RateLimited(u32),

    /// Any other non-2xx response
    #[error("API error {0}")]
    Status(u16),

    /// Body was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Body parsed but lacked the expected envelope
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Identifier rejected before any request was made
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Parse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
