//! Free-text person labels
//!
//! Chart labels look like `John Smith b. 12 Mar 1850, Ohio d. 1920`. The
//! name runs up to the first ` b.` or ` d.` marker; what follows is split
//! into birth and death clauses, each a date optionally followed by a comma
//! and a place.

mod date;

pub use date::{month_code, normalize_date, split_date_place};

use crate::model::DateFact;

const BIRTH_MARKER: &str = " b.";
const DEATH_MARKER: &str = " d.";
const LISTED_DEATH_MARKER: &str = ", d.";

/// Name and life facts extracted from one label
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedLabel {
    pub name: String,
    pub birth: DateFact,
    pub death: DateFact,
}

impl ParsedLabel {
    fn name_only(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Parse a label into name, birth and death.
///
/// Never fails: a label whose name part comes out empty is returned whole
/// as the name with no facts.
pub fn parse_label(label: &str) -> ParsedLabel {
    let label = label.trim();
    // ASCII lowering keeps byte offsets aligned with `label`
    let lower = label.to_ascii_lowercase();
    let birth_at = lower.find(BIRTH_MARKER);
    let death_at = lower.find(DEATH_MARKER);

    let (name, birth, death) = match (birth_at, death_at) {
        (Some(b), d) if d.map_or(true, |d| b < d) => {
            let rest = label[b + BIRTH_MARKER.len()..].trim();
            let (birth, death) = split_birth_clause(rest);
            (&label[..b], birth, death)
        }
        (_, Some(d)) => {
            let rest = label[d + DEATH_MARKER.len()..].trim();
            (&label[..d], "", rest)
        }
        _ => (label, "", ""),
    };

    let name = clean_name(name);
    if name.is_empty() {
        return ParsedLabel::name_only(label);
    }

    ParsedLabel {
        name,
        birth: split_date_place(birth),
        death: split_date_place(death),
    }
}

/// Split `3 Jan 1920, Dallas d. 1999` into its birth and death clauses
fn split_birth_clause(rest: &str) -> (&str, &str) {
    let lower = rest.to_ascii_lowercase();
    let listed = lower
        .find(LISTED_DEATH_MARKER)
        .map(|i| (i, LISTED_DEATH_MARKER.len()));
    let spaced = lower.find(DEATH_MARKER).map(|i| (i, DEATH_MARKER.len()));

    let split = match (listed, spaced) {
        (Some(l), Some(s)) => Some(if l.0 <= s.0 { l } else { s }),
        (l, s) => l.or(s),
    };

    match split {
        Some((at, len)) => (rest[..at].trim(), rest[at + len..].trim()),
        None => (rest, ""),
    }
}

fn clean_name(raw: &str) -> String {
    let name = raw.trim();
    name.strip_suffix(',').unwrap_or(name).trim().to_string()
}
