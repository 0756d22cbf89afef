//! ralert-core: retraction status resolution for scholarly works
//!
//! [`Checker`] is the entry point. It owns one cache, one rate gate shared
//! by every outbound request, and the Crossref and ORCID clients built on
//! top of them. Nothing here is global; two checkers never share state.

pub mod cache;
pub mod doi;
pub mod error;
pub mod heuristic;
pub mod pool;
pub mod record;
pub mod resolver;
pub mod services;
pub mod types;

pub use crate::cache::{CacheEntry, CacheStore, JsonFileStore, MemoryStore, ResultCache};
pub use crate::error::FetchError;
pub use crate::resolver::StatusResolver;
pub use crate::services::{AuthorWorksSource, WorkSource};
pub use crate::types::{AlertEntry, ArticleStatus, ReferenceCheckResult, StatusCounts, StatusResult};

use crate::services::{
    CrossrefClient, HttpTransport, MetadataClient, OrcidClient, RateGate, ReferenceChecker,
    WorksChecker,
};
use ralert_common::CheckerConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Resolution engine
pub struct Checker {
    config: CheckerConfig,
    cache: ResultCache,
    resolver: Arc<StatusResolver>,
    references: ReferenceChecker,
    works: WorksChecker,
}

impl Checker {
    /// Build a checker talking to the configured Crossref and ORCID endpoints
    ///
    /// Uses a [`JsonFileStore`] when `cache_file` is set, process memory
    /// otherwise.
    pub fn new(config: CheckerConfig) -> ralert_common::Result<Self> {
        config.validate()?;

        let store: Arc<dyn CacheStore> = match &config.cache_file {
            Some(path) => Arc::new(JsonFileStore::open(path)?),
            None => Arc::new(MemoryStore::new()),
        };

        let gate = Arc::new(RateGate::new(config.rate_limit_interval()));
        let transport = HttpTransport::new(&config, gate)?;
        let crossref = Arc::new(CrossrefClient::new(transport.clone(), &config.crossref_base_url));
        let orcid = Arc::new(OrcidClient::new(transport, &config.orcid_base_url));

        info!(
            crossref = %config.crossref_base_url,
            orcid = %config.orcid_base_url,
            rate_limit_ms = config.rate_limit_ms,
            persistent_cache = config.cache_file.is_some(),
            "Checker initialized"
        );

        Self::with_sources(config, store, crossref, orcid)
    }

    /// Build a checker over caller-supplied sources and store
    pub fn with_sources(
        config: CheckerConfig,
        store: Arc<dyn CacheStore>,
        works: Arc<dyn WorkSource>,
        authors: Arc<dyn AuthorWorksSource>,
    ) -> ralert_common::Result<Self> {
        config.validate()?;

        let cache = ResultCache::new(store, config.cache_ttl(), config.unknown_cache_ttl());
        let metadata = Arc::new(MetadataClient::new(works, cache.clone()));
        let resolver = Arc::new(StatusResolver::new(metadata, cache.clone()));
        let references = ReferenceChecker::new(Arc::clone(&resolver), config.max_concurrency);
        let works = WorksChecker::new(
            Arc::clone(&resolver),
            authors,
            cache.clone(),
            config.max_concurrency,
            config.max_referenced_dois,
        );

        Ok(Self {
            config,
            cache,
            resolver,
            references,
            works,
        })
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn resolver(&self) -> &Arc<StatusResolver> {
        &self.resolver
    }

    /// Status of a single work
    pub async fn check_status(&self, id: &str) -> StatusResult {
        self.resolver.check_status(id).await
    }

    pub async fn check_references<P>(&self, root_id: &str, on_progress: P, extra_ids: &[String]) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.references.check_references(root_id, on_progress, extra_ids).await
    }

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
        self.references
            .check_references_with_cancel(root_id, on_progress, extra_ids, cancel)
            .await
    }

    pub async fn fetch_author_dois(&self, orcid_id: &str) -> Vec<String> {
        self.works.fetch_author_dois(orcid_id).await
    }

    pub async fn check_own_works<P>(&self, orcid_id: &str, on_progress: P) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.works.check_own_works(orcid_id, on_progress).await
    }

    pub async fn check_own_works_with_cancel<P>(
        &self,
        orcid_id: &str,
        on_progress: P,
        cancel: &CancellationToken,
    ) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.works
            .check_own_works_with_cancel(orcid_id, on_progress, cancel)
            .await
    }

    pub async fn check_cited_by_own_works<P>(&self, dois: &[String], on_progress: P) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.works.check_cited_by_own_works(dois, on_progress).await
    }

    pub async fn check_cited_by_own_works_with_cancel<P>(
        &self,
        dois: &[String],
        on_progress: P,
        cancel: &CancellationToken,
    ) -> ReferenceCheckResult
    where
        P: Fn(usize, usize) + Send + Sync,
    {
        self.works
            .check_cited_by_own_works_with_cancel(dois, on_progress, cancel)
            .await
    }

    /// Drop every cached verdict, payload and author list
    pub async fn clear_cache(&self) -> ralert_common::Result<()> {
        self.cache.clear().await
    }

    /// Write buffered cache entries to the cache file
    ///
    /// A file-backed store also writes them when the checker is dropped.
    pub async fn flush_cache(&self) -> ralert_common::Result<()> {
        self.cache.flush().await
    }
}
