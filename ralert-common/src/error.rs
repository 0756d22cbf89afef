//! Common error types for retraction-alert

use thiserror::Error;

/// Common result type for retraction-alert operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing or configuring a checker
///
/// Resolution itself never fails: lookups degrade to an `unknown` status.
/// These variants only surface from setup paths (config, stores, clients).
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client construction error (wraps reqwest::Error)
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
