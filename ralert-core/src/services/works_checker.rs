//! Author-level checks
//!
//! Two views over an author's body of work: the status of their own works,
//! and the status of everything those works cite (capped).

use super::reference_checker::ReferenceChecker;
use super::AuthorWorksSource;
use crate::cache::{orcid_key, ResultCache};
use crate::doi::{is_doi, parse_orcid_id};
use crate::resolver::StatusResolver;
use crate::types::ReferenceCheckResult;
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct WorksChecker {
    references: ReferenceChecker,
    resolver: Arc<StatusResolver>,
    authors: Arc<dyn AuthorWorksSource>,
    cache: ResultCache,
    max_referenced_dois: usize,
}

impl WorksChecker {
    pub fn new(
        resolver: Arc<StatusResolver>,
        authors: Arc<dyn AuthorWorksSource>,
        cache: ResultCache,
        max_concurrency: usize,
        max_referenced_dois: usize,
    ) -> Self {
        Self {
            references: ReferenceChecker::new(Arc::clone(&resolver), max_concurrency),
            resolver,
            authors,
            cache,
            max_referenced_dois,
        }
    }

    pub fn max_referenced_dois(&self) -> usize {
        self.max_referenced_dois
    }

    /// DOIs listed on an author's ORCID record
    ///
    /// Empty lists (including failed lookups) are not cached.
    pub async fn fetch_author_dois(&self, orcid_id: &str) -> Vec<String> {
        let canonical = parse_orcid_id(orcid_id).unwrap_or_else(|| orcid_id.trim().to_string());
        let key = orcid_key(&canonical);

        if let Some(cached) = self.cache.get::<Vec<String>>(&key).await {
            debug!(orcid = %canonical, works = cached.len(), "Using cached author works");
            return cached;
        }

        let dois = self.authors.fetch_author_dois(&canonical).await;
        if !dois.is_empty() {
            self.cache.set(&key, &dois, None).await;
        }
        dois
    }

    pub async fn check_own_works<P>(&self, orcid_id: &str, on_progress: P) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.check_own_works_with_cancel(orcid_id, on_progress, &CancellationToken::new())
            .await
    }

    /// Status of every work on the author's record
    pub async fn check_own_works_with_cancel<P>(
        &self,
        orcid_id: &str,
        on_progress: P,
        cancel: &CancellationToken,
    ) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        let dois = self.fetch_author_dois(orcid_id).await;
        if dois.is_empty() {
            warn!(orcid = %orcid_id, "No works found for author, reporting inconclusive");
            return ReferenceCheckResult::inconclusive();
        }

        let result = self.references.run(&dois, on_progress, cancel).await;
        info!(
            orcid = %orcid_id,
            checked = result.checked,
            alerts = result.alerts.len(),
            "Own works check complete"
        );
        result
    }

    pub async fn check_cited_by_own_works<P>(&self, dois: &[String], on_progress: P) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.check_cited_by_own_works_with_cancel(dois, on_progress, &CancellationToken::new())
            .await
    }

    /// Status of everything cited by the given works
    pub async fn check_cited_by_own_works_with_cancel<P>(
        &self,
        dois: &[String],
        on_progress: P,
        cancel: &CancellationToken,
    ) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        let referenced = self.collect_referenced_dois(dois, cancel).await;
        if referenced.is_empty() {
            warn!(works = dois.len(), "No referenced DOIs collected, reporting inconclusive");
            return ReferenceCheckResult::inconclusive();
        }

        info!(
            works = dois.len(),
            referenced = referenced.len(),
            "Checking works cited by author"
        );
        self.references.run(&referenced, on_progress, cancel).await
    }

    /// Distinct reference DOIs across `dois`, at most `max_referenced_dois`
    ///
    /// The cap is checked before every fetch; once reached no further work
    /// is requested.
    pub async fn collect_referenced_dois(&self, dois: &[String], cancel: &CancellationToken) -> Vec<String> {
        let cap = self.max_referenced_dois;
        let mut seen = HashSet::new();
        let mut referenced = Vec::new();

        for doi in dois {
            if referenced.len() >= cap {
                debug!(cap = cap, "Reference cap reached");
                break;
            }
            if cancel.is_cancelled() {
                break;
            }
            if !is_doi(doi) {
                continue;
            }

            let Some(record) = self.resolver.metadata().fetch_record(doi).await else {
                continue;
            };

            for reference in record.reference_dois() {
                if referenced.len() >= cap {
                    break;
                }
                if seen.insert(reference.clone()) {
                    referenced.push(reference);
                }
            }
        }

        referenced
    }
}
