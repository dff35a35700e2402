//! Kit profile and segment-match records supplied by the CSV collaborator
//!
//! Field names follow the external record shapes so JSON exported by the
//! collaborator deserializes directly. Numeric columns are kept as strings:
//! they are passed through to GEDCOM, never computed with.

use crate::error::PedigraphResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One row of the kit profile list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProfileRecord {
    pub kit: String,
    pub name: String,
    pub email: String,
    #[serde(alias = "GED WikiTree")]
    pub ged_link: String,
    pub sex: String,
    pub atdna_total: String,
    pub largest_cm: String,
    pub source: String,
    pub overlap: String,
}

/// One row of a one-to-one segment-match report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentRecord {
    pub primary_kit: String,
    pub matched_kit: String,
    pub chr: String,
    pub b37_start: String,
    pub b37_end: String,
    pub cm: String,
    pub snps: String,
    pub matched_name: String,
    pub matched_sex: String,
    pub matched_email: String,
}

/// Segment rows grouped by the kit they were reported for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentIndex {
    by_kit: BTreeMap<String, Vec<SegmentRecord>>,
}

impl SegmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index rows by their primary kit, preserving input order
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a SegmentRecord>) -> Self {
        let mut index = Self::new();
        for record in records {
            index.insert(record.clone());
        }
        index
    }

    pub fn insert(&mut self, record: SegmentRecord) {
        let kit = record.primary_kit.trim().to_string();
        self.by_kit.entry(kit).or_default().push(record);
    }

    /// Segment rows for a kit, empty when the kit has none
    pub fn for_kit(&self, kit: &str) -> &[SegmentRecord] {
        self.by_kit
            .get(kit.trim())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.by_kit.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read a JSON array of records from disk
pub fn read_records<T: DeserializeOwned>(path: impl AsRef<Path>) -> PedigraphResult<Vec<T>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
