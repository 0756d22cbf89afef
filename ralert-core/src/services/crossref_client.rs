//! Crossref works API client
//!
//! `GET {base}/works/{doi}` returning `{ "message": { ... } }`. The DOI goes
//! into the path with its slashes intact; Crossref answers 400 for `%2F`.

use super::http::HttpTransport;
use super::WorkSource;
use crate::error::FetchError;
use crate::record::RawMetadata;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

/// Crossref API client
pub struct CrossrefClient {
    transport: HttpTransport,
    base_url: String,
}

impl CrossrefClient {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn work_url(&self, doi: &str) -> String {
        format!("{}/works/{}", self.base_url, encode_doi_path(doi))
    }

    /// Fetch the `message` object for a DOI
    pub async fn lookup_work(&self, doi: &str) -> Result<RawMetadata, FetchError> {
        let url = self.work_url(doi);
        debug!(doi = %doi, url = %url, "Querying Crossref API");

        let response = self.transport.get(&url, None).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let message = match body {
            Value::Object(mut envelope) => envelope.remove("message"),
            _ => None,
        };

        match message {
            Some(message @ Value::Object(_)) => {
                info!(doi = %doi, "Retrieved work from Crossref");
                Ok(message)
            }
            _ => Err(FetchError::MalformedPayload(format!(
                "no message object for {}",
                doi
            ))),
        }
    }
}

#[async_trait]
impl WorkSource for CrossrefClient {
    async fn fetch_work(&self, doi: &str) -> Option<RawMetadata> {
        match self.lookup_work(doi).await {
            Ok(message) => Some(message),
            Err(e) => {
                debug!(doi = %doi, error = %e, "Crossref lookup failed");
                None
            }
        }
    }
}

/// Escape only the characters that would end the path segment
fn encode_doi_path(doi: &str) -> String {
    let mut out = String::with_capacity(doi.len());
    for c in doi.chars() {
        match c {
            '%' => out.push_str("%25"),
            '?' => out.push_str("%3F"),
            '#' => out.push_str("%23"),
            ' ' => out.push_str("%20"),
            _ => out.push(c),
        }
    }
    out
}
