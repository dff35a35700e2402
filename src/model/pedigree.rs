//! Reconstruction output and its diagnostic log

use super::family::Family;
use super::person::{Person, PersonId};
use serde::{Deserialize, Serialize};

/// Which way a bracket was read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Parents on rows above the connector, child below
    ParentsAbove,
    /// Parents on rows below the connector, child above
    ParentsBelow,
}

/// Diagnostic entry describing one reconstruction decision.
///
/// Meant for people debugging odd charts, not for programmatic use.
/// `row` is always the line index in the raw text block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
    PersonFound {
        id: PersonId,
        name: String,
        row: usize,
        column: usize,
    },
    ControlMarker {
        row: usize,
        column: usize,
        label: String,
    },
    IndentScale {
        min_column: usize,
        step: usize,
    },
    SegmentAccepted {
        row: usize,
        left: usize,
        right: usize,
        orientation: Orientation,
        parents: Vec<PersonId>,
        child: PersonId,
    },
    SegmentRejected {
        row: usize,
        left: usize,
        right: usize,
        reason: String,
    },
    SlashAccepted {
        row: usize,
        column: usize,
        glyph: char,
        parent: PersonId,
        child: PersonId,
    },
    SlashRejected {
        row: usize,
        column: usize,
        glyph: char,
        reason: String,
    },
    LaneAccepted {
        row: usize,
        column: usize,
        parent: PersonId,
        child: PersonId,
    },
    LaneRejected {
        row: usize,
        column: usize,
        reason: String,
    },
    EdgeSkipped {
        child: PersonId,
        parent: PersonId,
        reason: String,
    },
    ParentsPruned {
        child: PersonId,
        kept: Vec<PersonId>,
        dropped: Vec<PersonId>,
    },
    SpouseConflict {
        parents: Vec<PersonId>,
    },
    Summary {
        people: usize,
        families: usize,
    },
}

/// People and families reconstructed from one chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pedigree {
    pub people: Vec<Person>,
    pub families: Vec<Family>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl Pedigree {
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.get(id.index())
    }

    /// Look a person up by parsed name
    pub fn find_by_name(&self, name: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.name == name)
    }

    /// The chart's subject: minimum indent, first discovered on ties
    pub fn root(&self) -> Option<&Person> {
        self.people
            .iter()
            .min_by_key(|p| (p.indent_level, p.id))
    }

    /// Family whose parent set is exactly `parents` (any order)
    pub fn family_of(&self, parents: &[PersonId]) -> Option<&Family> {
        let mut key = parents.to_vec();
        key.sort();
        self.families.iter().find(|f| f.parents == key)
    }
}
