//! Export metadata supplied alongside a pedigree

use crate::config::ExportConfig;
use crate::model::{ProfileRecord, SegmentIndex};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kit-level details written into the GEDCOM header and the root record.
///
/// Everything is optional; a default value yields a plain export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportMeta {
    pub kit: Option<String>,
    /// Display name for the root person, see [`format_root_name`](super::format_root_name)
    pub root_name_override: Option<String>,
    pub site_label: String,
    pub source_name: String,
    /// Kit to submitter email
    pub emails: BTreeMap<String, String>,
    pub total_cm: Option<String>,
    pub segments: SegmentIndex,
    pub export_date: Option<NaiveDate>,
}

impl Default for ExportMeta {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl ExportMeta {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            kit: None,
            root_name_override: None,
            site_label: config.site_label.clone(),
            source_name: config.source_name.clone(),
            emails: BTreeMap::new(),
            total_cm: None,
            segments: SegmentIndex::new(),
            export_date: None,
        }
    }

    /// Metadata for one kit from the loaded profile list and segment report
    pub fn for_kit(
        kit: &str,
        profiles: &[ProfileRecord],
        segments: &SegmentIndex,
        config: &ExportConfig,
    ) -> Self {
        let kit = kit.trim();
        let mut meta = Self::from_config(config).with_kit(kit);

        meta.emails = profiles
            .iter()
            .filter(|p| !p.kit.trim().is_empty() && !p.email.trim().is_empty())
            .map(|p| (p.kit.trim().to_string(), p.email.trim().to_string()))
            .collect();

        if let Some(profile) = profiles.iter().find(|p| p.kit.trim() == kit) {
            meta.root_name_override = non_empty(&profile.name);
            meta.total_cm = non_empty(&profile.atdna_total);
        }

        for record in segments.for_kit(kit) {
            meta.segments.insert(record.clone());
        }
        meta
    }

    pub fn with_kit(mut self, kit: impl Into<String>) -> Self {
        self.kit = Some(kit.into());
        self
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name_override = Some(name.into());
        self
    }

    pub fn with_total_cm(mut self, total: impl Into<String>) -> Self {
        self.total_cm = Some(total.into());
        self
    }

    pub fn with_email(mut self, kit: impl Into<String>, email: impl Into<String>) -> Self {
        self.emails.insert(kit.into(), email.into());
        self
    }

    pub fn with_segments(mut self, segments: SegmentIndex) -> Self {
        self.segments = segments;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.export_date = Some(date);
        self
    }

    /// Submitter email for the reference kit
    pub fn kit_email(&self) -> Option<&str> {
        let kit = self.kit.as_deref()?;
        self.emails.get(kit.trim()).map(String::as_str)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
