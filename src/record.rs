//! Record data model
//!
//! A [`Stub`] is what the listing page shows about an entity. The enricher
//! promotes it to a [`Record`], whose reference lists hold sub-resource links
//! until the resolver substitutes the resolved names back in.

use serde::Serialize;
use std::collections::BTreeMap;

/// A directly extracted field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
}

/// A partial record produced from one listing-page entry
#[derive(Debug, Clone, PartialEq)]
pub struct Stub {
    /// Canonical URL of the entity, absolute
    pub link: String,

    /// Display name, when the listing shows one
    pub name: Option<String>,

    /// Source URL of the record's asset, when the listing references one
    pub asset: Option<String>,

    /// Fields visible on the listing page
    pub fields: BTreeMap<String, FieldValue>,
}

impl Stub {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            name: None,
            asset: None,
            fields: BTreeMap::new(),
        }
    }
}

/// A fully enriched catalog entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Stable 1-based identifier, assigned once after the crawl
    pub id: usize,

    link: String,

    pub name: String,

    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,

    /// Named reference lists; links before resolution, names after
    #[serde(flatten)]
    pub references: BTreeMap<String, Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
}

impl Record {
    /// Promotes a stub to a record with the given identifier
    pub fn from_stub(id: usize, stub: Stub) -> Self {
        Self {
            id,
            link: stub.link,
            name: stub.name.unwrap_or_default(),
            fields: stub.fields,
            references: BTreeMap::new(),
            asset: stub.asset,
        }
    }

    /// The record's identity link; never changes after creation
    pub fn link(&self) -> &str {
        &self.link
    }

    /// Iterates every sub-resource link referenced by this record
    pub fn reference_links(&self) -> impl Iterator<Item = &str> {
        self.references.values().flatten().map(String::as_str)
    }
}

/// A shared linked entity, resolved once no matter how many records cite it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubResource {
    pub link: String,
    pub name: String,
}

/// Assigns gap-free ids in the order given
pub fn assign_ids(stubs: Vec<Stub>) -> Vec<Record> {
    stubs
        .into_iter()
        .enumerate()
        .map(|(index, stub)| Record::from_stub(index + 1, stub))
        .collect()
}

/// Restores listing order after an unordered pool stage
pub fn sort_by_id(records: &mut [Record]) {
    records.sort_by_key(|r| r.id);
}
