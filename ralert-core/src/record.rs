//! Defensive decoding of Crossref work payloads
//!
//! The `message` object of a Crossref work arrives loosely shaped. Every
//! field here is optional: absent or mistyped fields decode as empty, and a
//! malformed element inside a list is skipped without discarding its
//! siblings.

use crate::doi::{is_doi, normalize_doi};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Raw `message` payload as returned by the works endpoint
pub type RawMetadata = Value;

/// Item listed under one relation key (e.g. `is-retracted-by`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RelatedItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(rename = "id-type", default, deserialize_with = "lenient_string")]
    pub id_type: Option<String>,
}

/// Publisher assertion (label/value/name free text)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Assertion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(rename = "URL", default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

/// Later modification notice (`update-to` entry)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UpdateNotice {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub update_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: Option<String>,
    #[serde(rename = "DOI", default, deserialize_with = "lenient_string")]
    pub doi: Option<String>,
    #[serde(rename = "URL", default, deserialize_with = "lenient_string")]
    pub url: Option<String>,
}

/// Entry of the work's declared reference list
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReferenceItem {
    #[serde(rename = "DOI", default, deserialize_with = "lenient_string")]
    pub doi: Option<String>,
}

/// Typed view of a work record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkRecord {
    /// Relation key → related items, in key order
    pub relations: Vec<(String, Vec<RelatedItem>)>,
    pub assertions: Vec<Assertion>,
    pub updates: Vec<UpdateNotice>,
    pub update_policies: Vec<String>,
    pub references: Vec<ReferenceItem>,
    pub titles: Vec<String>,
}

impl WorkRecord {
    /// Decode a `message` object; non-objects decode as an empty record
    pub fn from_message(message: &Value) -> Self {
        Self {
            relations: decode_relations(message.get("relation")),
            assertions: decode_list(message.get("assertion")),
            updates: decode_list(message.get("update-to")),
            update_policies: decode_strings(message.get("update-policy")),
            references: decode_list(message.get("reference")),
            titles: decode_strings(message.get("title")),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.titles.first().map(String::as_str)
    }

    /// DOI-shaped reference ids, lower-cased, in declaration order
    ///
    /// Duplicates are kept; callers de-duplicate across sources.
    pub fn reference_dois(&self) -> Vec<String> {
        self.references
            .iter()
            .filter_map(|r| r.doi.as_deref())
            .filter(|doi| is_doi(doi))
            .map(normalize_doi)
            .collect()
    }
}

fn decode_list<T: DeserializeOwned>(field: Option<&Value>) -> Vec<T> {
    match field {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Accepts a single string or a list of strings
fn decode_strings(field: Option<&Value>) -> Vec<String> {
    match field {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_relations(field: Option<&Value>) -> Vec<(String, Vec<RelatedItem>)> {
    let Some(Value::Object(map)) = field else {
        return Vec::new();
    };

    map.iter()
        .map(|(key, value)| {
            let items = match value {
                Value::Object(_) => RelatedItem::deserialize(value).ok().into_iter().collect(),
                other => decode_list(Some(other)),
            };
            (key.clone(), items)
        })
        .collect()
}

/// Strings pass through; any other JSON type reads as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}
