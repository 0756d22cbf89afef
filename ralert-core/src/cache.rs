//! TTL result cache over a pluggable key/value store
//!
//! Keys are namespaced: `status:{doi}` for verdicts, `crossref:{doi}` for raw
//! work payloads, `orcid:{id}` for author DOI lists.
//!
//! Store failures never propagate. A failed read is a miss and a failed
//! write is logged and dropped; callers simply refetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ralert_common::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

/// Stored value with its write time and time-to-live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
    pub ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
            ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Fresh iff `now - stored_at < ttl`
    ///
    /// Entries stamped in the future (clock skew) count as stale.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match (now - self.stored_at).to_std() {
            Ok(elapsed) => elapsed < self.ttl(),
            Err(_) => false,
        }
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}

// ============================================================================
// Store collaborator
// ============================================================================

/// Backing key/value store
///
/// Implementations only store and return entries; freshness is decided by
/// [`ResultCache`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<Value>>>;

    async fn set(&self, key: &str, entry: CacheEntry<Value>) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Make every accepted write durable
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Process-memory store
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CacheEntry<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<Value>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry<Value>) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Writes buffered by [`JsonFileStore`] before the map is rewritten
pub const DEFAULT_PERSIST_EVERY: usize = 64;

/// JSON file store that survives restarts
///
/// Writes go to memory first. The whole map is rewritten (temp file +
/// rename) once `persist_every` writes are pending, on [`flush`], on
/// `clear` and when the store is dropped. File I/O runs on a snapshot, so
/// readers never wait on the disk. An unreadable or corrupt file starts
/// the store empty.
///
/// [`flush`]: CacheStore::flush
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, CacheEntry<Value>>>,
    pending: AtomicUsize,
    persist_every: usize,
    writer: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_batch(path, DEFAULT_PERSIST_EVERY)
    }

    /// Open with a custom write batch (`1` rewrites the file on every write)
    pub fn open_with_batch(path: impl AsRef<Path>, persist_every: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            pending: AtomicUsize::new(0),
            persist_every: persist_every.max(1),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes accepted but not yet on disk
    pub fn pending_writes(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    async fn persist(&self, content: String) -> Result<()> {
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, content).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CacheStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry<Value>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry<Value>) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), entry);

        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
        if pending >= self.persist_every {
            self.flush().await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        self.pending.fetch_add(1, Ordering::SeqCst);
        self.flush().await
    }

    async fn flush(&self) -> Result<()> {
        let _writer = self.writer.lock().await;

        // Writes landing after the swap are counted again and persisted later
        let pending = self.pending.swap(0, Ordering::SeqCst);
        if pending == 0 {
            return Ok(());
        }

        let snapshot = self.entries.read().await.clone();
        let written = match serde_json::to_string(&snapshot) {
            Ok(content) => self.persist(content).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = written {
            self.pending.fetch_add(pending, Ordering::SeqCst);
            return Err(e);
        }
        debug!(path = %self.path.display(), entries = snapshot.len(), writes = pending, "Cache file written");
        Ok(())
    }
}

impl Drop for JsonFileStore {
    fn drop(&mut self) {
        if *self.pending.get_mut() == 0 {
            return;
        }

        let written = serde_json::to_string(self.entries.get_mut())
            .map_err(std::io::Error::from)
            .and_then(|content| std::fs::write(self.tmp_path(), content))
            .and_then(|_| std::fs::rename(self.tmp_path(), &self.path));

        if let Err(e) = written {
            warn!(path = %self.path.display(), error = %e, "Cache file not written on close");
        }
    }
}

// ============================================================================
// Result cache
// ============================================================================

/// TTL-aware typed cache
///
/// Two TTL classes: `ttl` (long) for confirmed results and payloads,
/// `unknown_ttl` (short) so inconclusive lookups are retried soon.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    unknown_ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration, unknown_ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            unknown_ttl,
        }
    }

    /// In-memory cache with the given TTL classes
    pub fn in_memory(ttl: Duration, unknown_ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryStore::new()), ttl, unknown_ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn unknown_ttl(&self) -> Duration {
        self.unknown_ttl
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Fresh value for `key`, if any
    ///
    /// Stale, missing, unreadable and undecodable entries all read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = match self.store.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                debug!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        if !entry.is_fresh() {
            debug!(key = %key, "Cache entry stale");
            return None;
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key = %key, error = %e, "Cache entry undecodable, treating as miss");
                None
            }
        }
    }

    /// Store `value` under `key` (long TTL unless `ttl` is given)
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache value not serializable, skipping");
                return;
            }
        };

        let entry = CacheEntry::new(value, ttl.unwrap_or(self.ttl));
        if let Err(e) = self.store.set(key, entry).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Drop every entry
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Make buffered writes durable
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }
}

pub fn status_key(doi: &str) -> String {
    format!("status:{}", doi)
}

pub fn crossref_key(doi: &str) -> String {
    format!("crossref:{}", doi)
}

pub fn orcid_key(orcid_id: &str) -> String {
    format!("orcid:{}", orcid_id)
}
