//! In-process work and author sources that record their calls

use async_trait::async_trait;
use ralert_core::{AuthorWorksSource, WorkSource};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Work source backed by a map, counting lookups per DOI
#[derive(Default)]
pub struct SpyWorkSource {
    works: HashMap<String, Value>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl SpyWorkSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_work(mut self, doi: &str, message: Value) -> Self {
        self.works.insert(doi.to_lowercase(), message);
        self
    }

    /// Sleep this long inside every lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, doi: &str) -> usize {
        let doi = doi.to_lowercase();
        self.calls.lock().unwrap().iter().filter(|c| **c == doi).count()
    }
}

#[async_trait]
impl WorkSource for SpyWorkSource {
    async fn fetch_work(&self, doi: &str) -> Option<Value> {
        self.calls.lock().unwrap().push(doi.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.works.get(&doi.to_lowercase()).cloned()
    }
}

/// Author source with a fixed DOI list per ORCID iD
#[derive(Default)]
pub struct StaticAuthorSource {
    works: HashMap<String, Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl StaticAuthorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_author(mut self, orcid_id: &str, dois: &[&str]) -> Self {
        self.works
            .insert(orcid_id.to_string(), dois.iter().map(|d| d.to_string()).collect());
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthorWorksSource for StaticAuthorSource {
    async fn fetch_author_dois(&self, orcid_id: &str) -> Vec<String> {
        self.calls.lock().unwrap().push(orcid_id.to_string());
        self.works.get(orcid_id).cloned().unwrap_or_default()
    }
}
