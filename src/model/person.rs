//! Individuals discovered in a pedigree chart

use serde::{Deserialize, Serialize};

/// Identifier of a person within one capture.
///
/// Assigned in discovery order, so it doubles as the index into
/// [`Pedigree::people`](super::Pedigree). Identity is per capture only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(usize);

impl PersonId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the people vector
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sex as inferred from the anchor's render color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[default]
    #[serde(rename = "U")]
    Unknown,
}

impl Sex {
    /// Single-letter GEDCOM code
    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
            Sex::Unknown => "U",
        }
    }
}

/// A dated, optionally placed life event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFact {
    /// Normalized date: `D MON YYYY`, `MON YYYY`, `YYYY` or `ABT YYYY`
    pub date: Option<String>,
    /// Free-text place, trimmed
    pub place: Option<String>,
}

impl DateFact {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.place.is_none()
    }

    /// `None` when neither date nor place is known
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

/// A person in the reconstructed tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth: Option<DateFact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub death: Option<DateFact>,
    /// Absolute link to the person's page on the source site
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Character column of the label within its line
    pub column: usize,
    /// Quantized column, see [`IndentScale`](crate::IndentScale)
    pub indent_level: usize,
    /// Line of the raw text block the label was found on
    pub line_index: usize,
    /// At most two parents once reconstruction finishes
    #[serde(default)]
    pub parents: Vec<PersonId>,
    #[serde(default)]
    pub children: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse: Option<PersonId>,
}

impl Person {
    pub fn new(id: PersonId, name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id,
            name: name.into(),
            sex,
            birth: None,
            death: None,
            url: None,
            column: 0,
            indent_level: 0,
            line_index: 0,
            parents: Vec::new(),
            children: Vec::new(),
            spouse: None,
        }
    }

    /// Place the person at a line/column of the text block
    pub fn at(mut self, line_index: usize, column: usize) -> Self {
        self.line_index = line_index;
        self.column = column;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_birth(mut self, birth: DateFact) -> Self {
        self.birth = birth.into_option();
        self
    }

    pub fn with_death(mut self, death: DateFact) -> Self {
        self.death = death.into_option();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sex_serializes_as_gedcom_letter() {
        assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"F\"");
        let sex: Sex = serde_json::from_str("\"M\"").unwrap();
        assert_eq!(sex, Sex::Male);
    }

    #[test]
    fn empty_facts_are_dropped() {
        let person = Person::new(PersonId::new(0), "Ann", Sex::Female)
            .with_birth(DateFact::default())
            .with_death(DateFact {
                date: Some("1901".into()),
                place: None,
            });
        assert!(person.birth.is_none());
        assert_eq!(person.death.unwrap().date.as_deref(), Some("1901"));
    }

    #[test]
    fn person_id_serializes_as_number() {
        let json = serde_json::to_string(&PersonId::new(7)).unwrap();
        assert_eq!(json, "7");
    }
}
