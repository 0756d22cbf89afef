//! Upstream clients and graph checks
//!
//! The clients hide transport detail behind two seams, [`WorkSource`] and
//! [`AuthorWorksSource`]; everything above them deals in options and lists.

pub mod crossref_client;
pub mod http;
pub mod metadata_client;
pub mod orcid_client;
pub mod rate_limiter;
pub mod reference_checker;
pub mod works_checker;

pub use crossref_client::CrossrefClient;
pub use http::HttpTransport;
pub use metadata_client::MetadataClient;
pub use orcid_client::{OrcidClient, OrcidWorks};
pub use rate_limiter::RateGate;
pub use reference_checker::{ReferenceChecker, ReferenceSet};
pub use works_checker::WorksChecker;

use crate::record::RawMetadata;
use async_trait::async_trait;

/// Raw work lookup
///
/// `None` covers transport failures, non-2xx answers and malformed payloads.
#[async_trait]
pub trait WorkSource: Send + Sync {
    async fn fetch_work(&self, doi: &str) -> Option<RawMetadata>;
}

/// DOIs on an author's record; empty on failure
#[async_trait]
pub trait AuthorWorksSource: Send + Sync {
    async fn fetch_author_dois(&self, orcid_id: &str) -> Vec<String>;
}
