//! Single-identifier status resolution
//!
//! cache (`status:{doi}`) → fetch → detect → cache write. Every graph
//! check goes through [`StatusResolver::check_status`]; nothing else reads
//! or writes `status:` keys.

use crate::cache::{status_key, ResultCache};
use crate::doi::{is_resolvable, normalize_doi};
use crate::heuristic::detect_message;
use crate::services::MetadataClient;
use crate::types::{ArticleStatus, StatusResult};
use std::sync::Arc;
use tracing::debug;

pub struct StatusResolver {
    metadata: Arc<MetadataClient>,
    cache: ResultCache,
}

impl StatusResolver {
    pub fn new(metadata: Arc<MetadataClient>, cache: ResultCache) -> Self {
        Self { metadata, cache }
    }

    pub fn metadata(&self) -> &Arc<MetadataClient> {
        &self.metadata
    }

    /// Resolve the status of one identifier
    ///
    /// Never fails: non-DOI and excluded ids, upstream failures and
    /// malformed payloads all come back as `unknown`. Unknown verdicts are
    /// cached with the short TTL so they are retried soon.
    pub async fn check_status(&self, id: &str) -> StatusResult {
        if !is_resolvable(id) {
            debug!(id = %id, "Identifier not resolvable, skipping lookup");
            return StatusResult::unknown();
        }

        let doi = normalize_doi(id);
        let key = status_key(&doi);

        if let Some(cached) = self.cache.get::<StatusResult>(&key).await {
            debug!(doi = %doi, status = %cached.status, "Using cached status");
            return cached;
        }

        let Some(message) = self.metadata.fetch_work(&doi).await else {
            let unknown = StatusResult::unknown();
            self.cache
                .set(&key, &unknown, Some(self.cache.unknown_ttl()))
                .await;
            return unknown;
        };

        let result = detect_message(&message);
        let ttl = (result.status == ArticleStatus::Unknown).then(|| self.cache.unknown_ttl());
        self.cache.set(&key, &result, ttl).await;

        debug!(doi = %doi, status = %result.status, "Status resolved");
        result
    }
}
