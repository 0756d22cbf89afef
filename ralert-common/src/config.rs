//! Configuration loading for the retraction checker
//!
//! Resolution follows a fixed priority order:
//! 1. Explicit path passed by the caller (highest priority)
//! 2. `RALERT_CONFIG` environment variable
//! 3. Platform config file (`<config_dir>/retraction-alert/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing config file is never fatal: the loader warns and falls back
//! to defaults. Individual settings can then be overridden from the
//! environment (`RALERT_USER_AGENT`, `RALERT_CACHE_FILE`, `RALERT_LOG_LEVEL`).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RALERT_CONFIG";

const APP_DIR: &str = "retraction-alert";

/// Checker configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Base URL of the Crossref works API
    #[serde(default = "default_crossref_base_url")]
    pub crossref_base_url: String,

    /// Base URL of the ORCID public API
    #[serde(default = "default_orcid_base_url")]
    pub orcid_base_url: String,

    /// User-Agent sent with every outbound request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum spacing between any two outbound requests (milliseconds)
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,

    /// Retries after an HTTP 429 before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff used on 429 when no Retry-After header is present (milliseconds)
    #[serde(default = "default_retry_fallback_ms")]
    pub retry_fallback_ms: u64,

    /// Longest `Retry-After` honoured on 429; larger values are clamped (milliseconds)
    #[serde(default = "default_max_retry_after_ms")]
    pub max_retry_after_ms: u64,

    /// Upper bound on concurrent reference checks
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Hard ceiling on distinct DOIs collected for a citation closure
    #[serde(default = "default_max_referenced_dois")]
    pub max_referenced_dois: usize,

    /// TTL for resolved statuses and raw payloads (seconds)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// TTL for `unknown` results (seconds)
    #[serde(default = "default_unknown_cache_ttl_secs")]
    pub unknown_cache_ttl_secs: u64,

    /// Persistent cache file (in-memory cache if unset)
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_crossref_base_url() -> String {
    "https://api.crossref.org/v1".to_string()
}

fn default_orcid_base_url() -> String {
    "https://pub.orcid.org/v3.0".to_string()
}

fn default_user_agent() -> String {
    format!(
        "RetractionAlert/{} (https://Luca-Dellanna.com/contact)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_ms() -> u64 {
    100 // ~10 req/s spacing
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_fallback_ms() -> u64 {
    500
}

fn default_max_retry_after_ms() -> u64 {
    60_000
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_referenced_dois() -> usize {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_unknown_cache_ttl_secs() -> u64 {
    5 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            crossref_base_url: default_crossref_base_url(),
            orcid_base_url: default_orcid_base_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_ms: default_rate_limit_ms(),
            max_retries: default_max_retries(),
            retry_fallback_ms: default_retry_fallback_ms(),
            max_retry_after_ms: default_max_retry_after_ms(),
            max_concurrency: default_max_concurrency(),
            max_referenced_dois: default_max_referenced_dois(),
            cache_ttl_secs: default_cache_ttl_secs(),
            unknown_cache_ttl_secs: default_unknown_cache_ttl_secs(),
            cache_file: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl CheckerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rate_limit_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn retry_fallback(&self) -> Duration {
        Duration::from_millis(self.retry_fallback_ms)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_millis(self.max_retry_after_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn unknown_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.unknown_cache_ttl_secs)
    }

    /// Reject settings that would make the checker unusable
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".to_string()));
        }
        if self.max_referenced_dois == 0 {
            return Err(Error::Config(
                "max_referenced_dois must be at least 1".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("user_agent must not be empty".to_string()));
        }
        for (name, url) in [
            ("crossref_base_url", &self.crossref_base_url),
            ("orcid_base_url", &self.orcid_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::Config(format!("{} is not an http(s) URL: {}", name, url)));
            }
        }
        Ok(())
    }

    /// Apply `RALERT_*` environment overrides on top of the loaded values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(agent) = std::env::var("RALERT_USER_AGENT") {
            if !agent.trim().is_empty() {
                self.user_agent = agent;
            }
        }
        if let Ok(path) = std::env::var("RALERT_CACHE_FILE") {
            if !path.trim().is_empty() {
                self.cache_file = Some(PathBuf::from(path));
            }
        }
        if let Ok(level) = std::env::var("RALERT_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.logging.level = level;
            }
        }
    }
}

/// Load configuration following the documented priority order
///
/// Environment overrides are applied last; the result is validated.
pub fn load_config(explicit: Option<&Path>) -> Result<CheckerConfig> {
    let mut config = match resolve_config_path(explicit) {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            read_config_file(&path)?
        }
        Some(path) => {
            warn!(
                "Config file not found at {}, using compiled defaults",
                path.display()
            );
            CheckerConfig::default()
        }
        None => CheckerConfig::default(),
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Parse a TOML config file
pub fn read_config_file(path: &Path) -> Result<CheckerConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read config failed: {}", e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse config failed: {}", e)))
}

/// Write a config file atomically (temp file + rename)
pub fn write_config_file(config: &CheckerConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize config failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: caller-supplied path
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config file, only if it exists
    default_config_path().filter(|p| p.exists())
}

/// Platform config file location (`~/.config/retraction-alert/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Platform location for the persistent cache file
pub fn default_cache_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join(APP_DIR).join("cache.json"))
}
