//! Status detection from a work record
//!
//! Signal sources are tried in a fixed order and the first match wins:
//!
//! 1. `relation` keys (structured, most reliable)
//! 2. `assertion` free text (curated, less structured)
//! 3. `update-to` notices
//! 4. `update-policy` text (least specific, label only)
//!
//! No match means `ok`. Detection is pure; it never touches the network.

use crate::doi::doi_url;
use crate::record::{RawMetadata, WorkRecord};
use crate::types::{ArticleStatus, StatusResult};

/// Match produced by one extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub status: ArticleStatus,
    pub label: String,
    pub notice_url: Option<String>,
}

/// Signal extractor over a decoded record
pub type Extractor = fn(&WorkRecord) -> Option<Signal>;

/// Extractors in precedence order
pub const EXTRACTORS: [(&str, Extractor); 4] = [
    ("relation", from_relations),
    ("assertion", from_assertions),
    ("update-to", from_updates),
    ("update-policy", from_update_policies),
];

/// Verdict for a decoded record
pub fn detect(record: &WorkRecord) -> StatusResult {
    let title = record.title().map(str::to_owned);

    match EXTRACTORS.iter().find_map(|(_, extract)| extract(record)) {
        Some(signal) => StatusResult::alert(signal.status, signal.label, signal.notice_url, title),
        None => StatusResult::ok(title),
    }
}

/// Verdict for a raw `message` payload
pub fn detect_message(message: &RawMetadata) -> StatusResult {
    detect(&WorkRecord::from_message(message))
}

/// Classify notice text (case-insensitive substring match)
pub fn classify_text(text: &str) -> Option<ArticleStatus> {
    let normalized = text.to_lowercase();
    if normalized.contains("retract") {
        Some(ArticleStatus::Retracted)
    } else if normalized.contains("withdraw") {
        Some(ArticleStatus::Withdrawn)
    } else if normalized.contains("expression of concern") {
        Some(ArticleStatus::ExpressionOfConcern)
    } else {
        None
    }
}

/// Classify a relation key such as `is-retracted-by`
pub fn classify_relation_key(key: &str) -> Option<ArticleStatus> {
    let normalized = key.to_lowercase();
    if normalized.contains("retract") {
        Some(ArticleStatus::Retracted)
    } else if normalized.contains("withdraw") {
        Some(ArticleStatus::Withdrawn)
    } else if normalized.contains("expression") {
        Some(ArticleStatus::ExpressionOfConcern)
    } else {
        None
    }
}

pub fn from_relations(record: &WorkRecord) -> Option<Signal> {
    record.relations.iter().find_map(|(key, items)| {
        let status = classify_relation_key(key)?;
        let notice_url = items
            .iter()
            .find(|item| {
                item.id_type
                    .as_deref()
                    .is_some_and(|t| t.eq_ignore_ascii_case("doi"))
            })
            .and_then(|item| item.id.as_deref())
            .map(doi_url);

        Some(Signal {
            status,
            label: key.clone(),
            notice_url,
        })
    })
}

pub fn from_assertions(record: &WorkRecord) -> Option<Signal> {
    record.assertions.iter().find_map(|assertion| {
        let (status, text) = [&assertion.label, &assertion.value, &assertion.name]
            .into_iter()
            .flatten()
            .find_map(|text| classify_text(text).map(|status| (status, text.clone())))?;

        let notice_url = assertion
            .url
            .clone()
            .or_else(|| assertion.value.clone().filter(|v| is_absolute_url(v)));

        Some(Signal {
            status,
            label: text,
            notice_url,
        })
    })
}

pub fn from_updates(record: &WorkRecord) -> Option<Signal> {
    record.updates.iter().find_map(|update| {
        let status = [&update.update_type, &update.label]
            .into_iter()
            .flatten()
            .find_map(|text| classify_text(text))?;

        let label = update
            .label
            .clone()
            .filter(|l| !l.is_empty())
            .or_else(|| update.update_type.clone())
            .unwrap_or_default();

        let notice_url = update
            .url
            .clone()
            .or_else(|| update.doi.as_deref().map(doi_url));

        Some(Signal {
            status,
            label,
            notice_url,
        })
    })
}

pub fn from_update_policies(record: &WorkRecord) -> Option<Signal> {
    record.update_policies.iter().find_map(|policy| {
        classify_text(policy).map(|status| Signal {
            status,
            label: policy.clone(),
            notice_url: None,
        })
    })
}

fn is_absolute_url(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
