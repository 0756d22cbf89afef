//! Result types shared by every check operation
//!
//! Field names serialize in camelCase so results can be handed to a
//! browser-side caller unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Status
// ============================================================================

/// Integrity status of a single work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    Ok,
    Retracted,
    Withdrawn,
    ExpressionOfConcern,
    Unknown,
}

impl ArticleStatus {
    pub const ALL: [ArticleStatus; 5] = [
        ArticleStatus::Ok,
        ArticleStatus::Retracted,
        ArticleStatus::Withdrawn,
        ArticleStatus::ExpressionOfConcern,
        ArticleStatus::Unknown,
    ];

    /// Retracted, withdrawn and expression-of-concern raise an alert
    pub fn is_alert(self) -> bool {
        matches!(
            self,
            ArticleStatus::Retracted | ArticleStatus::Withdrawn | ArticleStatus::ExpressionOfConcern
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Ok => "ok",
            ArticleStatus::Retracted => "retracted",
            ArticleStatus::Withdrawn => "withdrawn",
            ArticleStatus::ExpressionOfConcern => "expression_of_concern",
            ArticleStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one identifier
///
/// `label` and `notice_url` are only populated for alerting statuses.
/// `title` may accompany `ok` as well; `unknown` carries nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub status: ArticleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl StatusResult {
    pub fn unknown() -> Self {
        Self {
            status: ArticleStatus::Unknown,
            label: None,
            notice_url: None,
            title: None,
        }
    }

    pub fn ok(title: Option<String>) -> Self {
        Self {
            status: ArticleStatus::Ok,
            label: None,
            notice_url: None,
            title,
        }
    }

    /// Build an alerting verdict
    ///
    /// Non-alerting statuses drop the label and notice URL.
    pub fn alert(
        status: ArticleStatus,
        label: impl Into<String>,
        notice_url: Option<String>,
        title: Option<String>,
    ) -> Self {
        match status {
            ArticleStatus::Unknown => Self::unknown(),
            ArticleStatus::Ok => Self::ok(title),
            _ => Self {
                status,
                label: Some(label.into()),
                notice_url,
                title,
            },
        }
    }

    pub fn is_alert(&self) -> bool {
        self.status.is_alert()
    }
}

// ============================================================================
// Graph check results
// ============================================================================

/// One cited or owned work that carries an alerting status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEntry {
    pub id: String,
    pub status: ArticleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl AlertEntry {
    pub fn from_result(id: impl Into<String>, result: StatusResult) -> Self {
        Self {
            id: id.into(),
            status: result.status,
            notice_url: result.notice_url,
            label: result.label,
            title: result.title,
        }
    }
}

/// Per-status tallies (serialized as a status → count map)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub ok: usize,
    pub retracted: usize,
    pub withdrawn: usize,
    pub expression_of_concern: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn get(&self, status: ArticleStatus) -> usize {
        match status {
            ArticleStatus::Ok => self.ok,
            ArticleStatus::Retracted => self.retracted,
            ArticleStatus::Withdrawn => self.withdrawn,
            ArticleStatus::ExpressionOfConcern => self.expression_of_concern,
            ArticleStatus::Unknown => self.unknown,
        }
    }

    pub fn increment(&mut self, status: ArticleStatus) {
        match status {
            ArticleStatus::Ok => self.ok += 1,
            ArticleStatus::Retracted => self.retracted += 1,
            ArticleStatus::Withdrawn => self.withdrawn += 1,
            ArticleStatus::ExpressionOfConcern => self.expression_of_concern += 1,
            ArticleStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        ArticleStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    pub fn alerting(&self) -> usize {
        self.retracted + self.withdrawn + self.expression_of_concern
    }
}

/// Aggregate outcome of a reference or works check
///
/// Invariants: `counts.total() == checked`, `failed_checks <= checked`,
/// `alerts.len() == counts.alerting()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCheckResult {
    pub alerts: Vec<AlertEntry>,
    pub checked: usize,
    pub total_found: usize,
    pub failed_checks: usize,
    pub counts: StatusCounts,
}

impl ReferenceCheckResult {
    /// "Could not check" result: one failed check, nothing else
    pub fn inconclusive() -> Self {
        Self {
            alerts: Vec::new(),
            checked: 1,
            total_found: 0,
            failed_checks: 1,
            counts: StatusCounts {
                unknown: 1,
                ..StatusCounts::default()
            },
        }
    }

    /// Record one completed check
    pub fn record(&mut self, id: &str, result: StatusResult) {
        self.checked += 1;
        self.counts.increment(result.status);
        if result.status == ArticleStatus::Unknown {
            self.failed_checks += 1;
        } else if result.is_alert() {
            self.alerts.push(AlertEntry::from_result(id, result));
        }
    }

    /// True when any check was inconclusive
    pub fn has_failures(&self) -> bool {
        self.failed_checks > 0
    }
}
