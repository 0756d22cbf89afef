//! ORCID public API client
//!
//! `GET {base}/{orcid}/works` (`Accept: application/json`). Only external
//! ids typed `doi` whose value is DOI-shaped are kept.

use super::http::HttpTransport;
use super::AuthorWorksSource;
use crate::doi::{is_doi, normalize_doi, parse_orcid_id};
use crate::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

#[derive(Debug, Default, Deserialize)]
pub struct OrcidWorks {
    #[serde(default, deserialize_with = "lenient_list")]
    pub group: Vec<OrcidWorkGroup>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrcidWorkGroup {
    #[serde(rename = "external-ids", default)]
    pub external_ids: Option<OrcidExternalIds>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrcidExternalIds {
    #[serde(rename = "external-id", default, deserialize_with = "lenient_list")]
    pub external_id: Vec<OrcidExternalId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrcidExternalId {
    #[serde(rename = "external-id-type", default)]
    pub id_type: Option<Value>,
    #[serde(rename = "external-id-value", default)]
    pub value: Option<Value>,
}

impl OrcidWorks {
    /// Distinct DOIs in listing order, lower-cased
    pub fn dois(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.group
            .iter()
            .filter_map(|g| g.external_ids.as_ref())
            .flat_map(|ids| ids.external_id.iter())
            .filter(|ext| {
                ext.id_type
                    .as_ref()
                    .and_then(Value::as_str)
                    .is_some_and(|t| t.eq_ignore_ascii_case("doi"))
            })
            .filter_map(|ext| ext.value.as_ref().and_then(Value::as_str))
            .filter(|value| is_doi(value))
            .map(normalize_doi)
            .filter(|doi| seen.insert(doi.clone()))
            .collect()
    }
}

/// ORCID API client
pub struct OrcidClient {
    transport: HttpTransport,
    base_url: String,
}

impl OrcidClient {
    pub fn new(transport: HttpTransport, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn works_url(&self, orcid_id: &str) -> String {
        format!("{}/{}/works", self.base_url, orcid_id)
    }

    /// DOIs declared on an author's record
    pub async fn lookup_works(&self, orcid_id: &str) -> Result<Vec<String>, FetchError> {
        let orcid_id = parse_orcid_id(orcid_id)
            .ok_or_else(|| FetchError::InvalidIdentifier(orcid_id.to_string()))?;

        let url = self.works_url(&orcid_id);
        debug!(orcid = %orcid_id, url = %url, "Querying ORCID API");

        let response = self.transport.get(&url, Some("application/json")).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let works: OrcidWorks = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let dois = works.dois();
        info!(orcid = %orcid_id, works = dois.len(), "Retrieved works from ORCID");
        Ok(dois)
    }
}

#[async_trait]
impl AuthorWorksSource for OrcidClient {
    async fn fetch_author_dois(&self, orcid_id: &str) -> Vec<String> {
        match self.lookup_works(orcid_id).await {
            Ok(dois) => dois,
            Err(e) => {
                debug!(orcid = %orcid_id, error = %e, "ORCID lookup failed");
                Vec::new()
            }
        }
    }
}

/// Lists of mixed-quality elements: bad elements are dropped, non-lists are empty
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dois_extracted_and_deduplicated() {
        let body = json!({
            "group": [
                {"external-ids": {"external-id": [
                    {"external-id-type": "doi", "external-id-value": "10.1000/A"},
                    {"external-id-type": "pmid", "external-id-value": "123456"}
                ]}},
                {"external-ids": {"external-id": [
                    {"external-id-type": "DOI", "external-id-value": "10.1000/a"},
                    {"external-id-type": "doi", "external-id-value": "not-a-doi"}
                ]}},
                {"external-ids": null},
                {"external-ids": {"external-id": [
                    {"external-id-type": "doi", "external-id-value": "10.2000/b"}
                ]}}
            ]
        });

        let works: OrcidWorks = serde_json::from_value(body).unwrap();
        assert_eq!(works.dois(), vec!["10.1000/a".to_string(), "10.2000/b".to_string()]);
    }

    #[test]
    fn test_malformed_groups_tolerated() {
        let body = json!({
            "group": [
                "junk",
                {"external-ids": {"external-id": "junk"}},
                {"external-ids": {"external-id": [
                    {"external-id-type": 5, "external-id-value": "10.1/x"},
                    {"external-id-type": "doi", "external-id-value": "10.1/y"}
                ]}}
            ]
        });

        let works: OrcidWorks = serde_json::from_value(body).unwrap();
        assert_eq!(works.dois(), vec!["10.1/y".to_string()]);
    }

    #[test]
    fn test_missing_group_is_empty() {
        let works: OrcidWorks = serde_json::from_value(json!({})).unwrap();
        assert!(works.dois().is_empty());
    }
}
