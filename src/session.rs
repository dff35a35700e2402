//! Capture sessions: the queue of kits to visit and what was captured
//!
//! A session is plain data. It is persisted only through a
//! [`CaptureStore`](crate::storage::CaptureStore), never kept in globals.

use crate::error::{PedigraphError, PedigraphResult};
use crate::links::LinkResolver;
use crate::model::{Pedigree, ProfileRecord};
use crate::storage::{CaptureStore, StorageResult};
use crate::tokenize::TokenStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Current session format version
pub const SESSION_VERSION: u32 = 1;

/// Progress of one kit through capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    #[default]
    Pending,
    Captured,
    Finalized,
}

impl CaptureStatus {
    /// Traffic-light color shown next to the kit
    pub fn color(self) -> &'static str {
        match self {
            CaptureStatus::Pending => "red",
            CaptureStatus::Captured => "yellow",
            CaptureStatus::Finalized => "green",
        }
    }
}

impl std::fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CaptureStatus::Pending => "pending",
            CaptureStatus::Captured => "captured",
            CaptureStatus::Finalized => "finalized",
        };
        write!(f, "{label}")
    }
}

/// A profile with a resolvable tree page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedProfile {
    #[serde(flatten)]
    pub profile: ProfileRecord,
    pub tree_url: String,
}

impl QueuedProfile {
    pub fn kit(&self) -> &str {
        self.profile.kit.trim()
    }
}

/// The kit queue and per-kit status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub profiles: Vec<QueuedProfile>,
    /// Position of the next profile to open
    pub queue_index: usize,
    pub focused_kit: Option<String>,
    #[serde(default)]
    pub status_by_kit: BTreeMap<String, CaptureStatus>,
}

impl Session {
    /// Queue every profile whose tree link resolves
    pub fn from_profiles(records: Vec<ProfileRecord>, links: &LinkResolver) -> Self {
        let profiles: Vec<QueuedProfile> = records
            .into_iter()
            .filter(|p| !p.kit.trim().is_empty())
            .filter_map(|profile| {
                let tree_url = links.resolve(&profile.ged_link)?;
                Some(QueuedProfile { profile, tree_url })
            })
            .collect();
        let status_by_kit = profiles
            .iter()
            .map(|p| (p.kit().to_string(), CaptureStatus::Pending))
            .collect();

        Self {
            version: SESSION_VERSION,
            created_at: Utc::now(),
            profiles,
            queue_index: 0,
            focused_kit: None,
            status_by_kit,
        }
    }

    pub fn profile(&self, kit: &str) -> Option<&QueuedProfile> {
        let kit = kit.trim();
        self.profiles.iter().find(|p| p.kit() == kit)
    }

    /// Open the next queued profile and focus it.
    ///
    /// Past the end of the queue this keeps returning the last profile.
    pub fn next_profile(&mut self) -> Option<&QueuedProfile> {
        let last = self.profiles.len().checked_sub(1)?;
        let index = self.queue_index.min(last);
        self.queue_index = index + 1;
        self.focused_kit = Some(self.profiles[index].kit().to_string());
        self.profiles.get(index)
    }

    pub fn focus(&mut self, kit: &str) -> PedigraphResult<&QueuedProfile> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.kit() == kit.trim())
            .ok_or_else(|| PedigraphError::UnknownKit(kit.to_string()))?;
        self.focused_kit = Some(self.profiles[index].kit().to_string());
        Ok(&self.profiles[index])
    }

    pub fn focused(&self) -> Option<&QueuedProfile> {
        self.focused_kit.as_deref().and_then(|kit| self.profile(kit))
    }

    pub fn status(&self, kit: &str) -> CaptureStatus {
        self.status_by_kit.get(kit.trim()).copied().unwrap_or_default()
    }

    pub fn set_status(&mut self, kit: &str, status: CaptureStatus) -> PedigraphResult<()> {
        let kit = self
            .profile(kit)
            .map(|p| p.kit().to_string())
            .ok_or_else(|| PedigraphError::UnknownKit(kit.to_string()))?;
        self.status_by_kit.insert(kit, status);
        Ok(())
    }

    /// Kits still waiting for a capture, in queue order
    pub fn pending_kits(&self) -> Vec<String> {
        self.profiles
            .iter()
            .filter(|p| self.status(p.kit()) == CaptureStatus::Pending)
            .map(|p| p.kit().to_string())
            .collect()
    }

    /// Number of profiles in each status
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for profile in &self.profiles {
            *counts.entry(self.status(profile.kit()).to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// The stored result of capturing one kit's tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capture {
    pub kit: String,
    pub source_url: Option<String>,
    pub captured_at: DateTime<Utc>,
    pub pedigree: Pedigree,
    pub gedcom: String,
    #[serde(default)]
    pub stats: TokenStats,
}

impl Capture {
    pub fn new(kit: impl Into<String>, pedigree: Pedigree, gedcom: impl Into<String>) -> Self {
        Self {
            kit: kit.into(),
            source_url: None,
            captured_at: Utc::now(),
            pedigree,
            gedcom: gedcom.into(),
            stats: TokenStats::default(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_stats(mut self, stats: TokenStats) -> Self {
        self.stats = stats;
        self
    }
}

/// One row of the capture listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSummary {
    pub kit: String,
    pub captured_at: DateTime<Utc>,
    pub people: usize,
    pub families: usize,
}

/// Site a bundle was captured from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSource {
    pub site: String,
}

/// The whole session and every stored capture as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub exported_at: DateTime<Utc>,
    pub source: BundleSource,
    pub profiles: Vec<QueuedProfile>,
    #[serde(default)]
    pub status_by_kit: BTreeMap<String, CaptureStatus>,
    pub captures: Vec<Capture>,
}

impl Bundle {
    pub fn new(session: &Session, captures: Vec<Capture>, site: impl Into<String>) -> Self {
        Self {
            exported_at: Utc::now(),
            source: BundleSource { site: site.into() },
            profiles: session.profiles.clone(),
            status_by_kit: session.status_by_kit.clone(),
            captures,
        }
    }

    /// Collect every capture in `store`, ordered by kit
    pub fn from_store<S: CaptureStore + ?Sized>(
        session: &Session,
        store: &S,
        site: impl Into<String>,
    ) -> StorageResult<Self> {
        let mut captures = Vec::new();
        for summary in store.list_captures()? {
            if let Some(capture) = store.load_capture(&summary.kit)? {
                captures.push(capture);
            }
        }
        info!(
            profiles = session.profiles.len(),
            captures = captures.len(),
            "bundled session"
        );
        Ok(Self::new(session, captures, site))
    }
}
