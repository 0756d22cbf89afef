//! Test Helper Utilities
//!
//! Shared utilities for testing ralert-core

#![allow(dead_code)]

pub mod log_capture;
pub mod mock_upstream;
pub mod sources;

pub use log_capture::{capture_logs, init_test_logging, LogCapture};
pub use mock_upstream::{MockUpstream, Reply};
pub use sources::{SpyWorkSource, StaticAuthorSource};

use ralert_common::CheckerConfig;
use ralert_core::{Checker, MemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;

pub const RETRACTED_DOI: &str = "10.1038/s41586-024-07219-0";
pub const ROOT_DOI: &str = "10.1007/s10668-019-00320-9";
pub const ORCID_ID: &str = "0000-0002-1825-0097";

/// `message` of a work with nothing to report
pub fn ok_work(title: &str) -> Value {
    json!({ "title": [title] })
}

/// `message` carrying a retraction notice in `update-to`
pub fn retracted_work(title: &str) -> Value {
    json!({
        "title": [title],
        "update-to": [{
            "type": "retraction",
            "label": "Retraction",
            "DOI": "10.1038/s41586-024-08077-6"
        }]
    })
}

/// `message` carrying an expression-of-concern assertion
pub fn concern_work() -> Value {
    json!({
        "assertion": [{
            "name": "notice",
            "label": "Expression of Concern",
            "URL": "https://example.org/eoc"
        }]
    })
}

/// `message` declaring the given references
pub fn work_with_references(references: &[&str]) -> Value {
    let items: Vec<Value> = references.iter().map(|doi| json!({ "DOI": doi })).collect();
    json!({ "title": ["Root work"], "reference": items })
}

/// Defaults with fast pacing for offline tests
pub fn fast_config() -> CheckerConfig {
    CheckerConfig {
        rate_limit_ms: 1,
        retry_fallback_ms: 10,
        ..CheckerConfig::default()
    }
}

/// Config pointing both clients at a mock upstream
pub fn mock_config(base_url: &str) -> CheckerConfig {
    CheckerConfig {
        crossref_base_url: base_url.to_string(),
        orcid_base_url: format!("{}/orcid", base_url),
        request_timeout_secs: 5,
        ..fast_config()
    }
}

/// Checker over in-process sources and a memory store
pub fn spy_checker(
    config: CheckerConfig,
    works: Arc<SpyWorkSource>,
    authors: Arc<StaticAuthorSource>,
) -> Checker {
    Checker::with_sources(config, Arc::new(MemoryStore::new()), works, authors)
        .expect("test config is valid")
}
