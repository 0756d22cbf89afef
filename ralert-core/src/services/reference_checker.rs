//! Reference graph check for one root work
//!
//! The root's declared references are unioned with caller-supplied ids
//! (e.g. DOIs scraped from a PubMed page), de-duplicated case-insensitively
//! and pushed through the worker pool.

use crate::doi::{is_doi, normalize_doi};
use crate::pool::check_all;
use crate::record::WorkRecord;
use crate::resolver::StatusResolver;
use crate::types::ReferenceCheckResult;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Ids to check for a root work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    /// Distinct lower-cased DOIs in first-seen order
    pub ids: Vec<String>,
    /// Reference DOIs plus DOI-shaped extra ids, before de-duplication
    pub total_found: usize,
}

impl ReferenceSet {
    pub fn collect(record: Option<&WorkRecord>, extra_ids: &[String]) -> Self {
        let declared = record.map(WorkRecord::reference_dois).unwrap_or_default();
        let extra: Vec<String> = extra_ids
            .iter()
            .filter(|id| is_doi(id))
            .map(|id| normalize_doi(id))
            .collect();

        let total_found = declared.len() + extra.len();
        let mut seen = HashSet::new();
        let ids = declared
            .into_iter()
            .chain(extra)
            .filter(|id| seen.insert(id.clone()))
            .collect();

        Self { ids, total_found }
    }
}

pub struct ReferenceChecker {
    resolver: Arc<StatusResolver>,
    max_concurrency: usize,
}

impl ReferenceChecker {
    pub fn new(resolver: Arc<StatusResolver>, max_concurrency: usize) -> Self {
        Self {
            resolver,
            max_concurrency,
        }
    }

    /// Check every reference of `root_id` plus `extra_ids`
    ///
    /// `on_progress(done, total)` fires after each completed item.
    pub async fn check_references<P>(
        &self,
        root_id: &str,
        on_progress: P,
        extra_ids: &[String],
    ) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.check_references_with_cancel(root_id, on_progress, extra_ids, &CancellationToken::new())
            .await
    }

    /// As [`check_references`](Self::check_references), stopping new work once `cancel` fires
    pub async fn check_references_with_cancel<P>(
        &self,
        root_id: &str,
        on_progress: P,
        extra_ids: &[String],
        cancel: &CancellationToken,
    ) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        // Non-DOI roots (e.g. PMIDs) are never sent upstream. OSF roots are
        // fetched: only their own status is out of reach, not their references.
        let root = if is_doi(root_id) {
            self.resolver.metadata().fetch_record(root_id).await
        } else {
            None
        };

        let references = ReferenceSet::collect(root.as_ref(), extra_ids);

        if root.is_none() && references.ids.is_empty() {
            warn!(root = %root_id, "Root lookup failed and no extra ids, reporting inconclusive");
            return ReferenceCheckResult::inconclusive();
        }

        info!(
            root = %root_id,
            total_found = references.total_found,
            checking = references.ids.len(),
            "Checking references"
        );

        let mut result = self.run(&references.ids, on_progress, cancel).await;
        result.total_found = references.total_found;

        info!(
            root = %root_id,
            checked = result.checked,
            alerts = result.alerts.len(),
            failed = result.failed_checks,
            "Reference check complete"
        );
        result
    }

    /// Run the worker pool over an explicit id list
    pub async fn run<P>(&self, ids: &[String], on_progress: P, cancel: &CancellationToken) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        let resolver = &self.resolver;
        check_all(
            ids,
            self.max_concurrency,
            |id| async move { resolver.check_status(&id).await },
            on_progress,
            cancel,
        )
        .await
    }
}
