//! Cached work lookups
//!
//! Raw payloads are cached under `crossref:{doi}` with the long TTL,
//! independent of whether a verdict can be derived from them, so status
//! detection and reference extraction share one fetch.

use super::WorkSource;
use crate::cache::{crossref_key, ResultCache};
use crate::doi::normalize_doi;
use crate::record::{RawMetadata, WorkRecord};
use std::sync::Arc;
use tracing::debug;

pub struct MetadataClient {
    source: Arc<dyn WorkSource>,
    cache: ResultCache,
}

impl MetadataClient {
    pub fn new(source: Arc<dyn WorkSource>, cache: ResultCache) -> Self {
        Self { source, cache }
    }

    /// Raw `message` for a DOI, from cache or upstream
    ///
    /// `None` covers every failure mode; nothing is cached in that case.
    pub async fn fetch_work(&self, id: &str) -> Option<RawMetadata> {
        let doi = normalize_doi(id);
        let key = crossref_key(&doi);

        if let Some(cached) = self.cache.get::<RawMetadata>(&key).await {
            debug!(doi = %doi, "Using cached work payload");
            return Some(cached);
        }

        let message = self.source.fetch_work(&doi).await?;
        self.cache.set(&key, &message, None).await;
        Some(message)
    }

    /// Decoded record for a DOI
    pub async fn fetch_record(&self, id: &str) -> Option<WorkRecord> {
        self.fetch_work(id)
            .await
            .map(|message| WorkRecord::from_message(&message))
    }
}
