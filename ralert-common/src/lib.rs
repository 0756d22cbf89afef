//! # Retraction Alert Common Library
//!
//! Shared code for the retraction-alert crates including:
//! - Error and result types
//! - Configuration loading (TOML, environment, compiled defaults)
//! - Logging initialization

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CheckerConfig, LoggingConfig};
pub use error::{Error, Result};
