//! Common test utilities for pedigraph integration tests
//!
//! Builders for extracted pages and profile records, plus the structural
//! checks every reconstructed pedigree must pass.

#![allow(dead_code)]

use pedigraph::{Anchor, ExtractedPage, ParseConfig, Pedigree, PersonId, ProfileRecord};

/// Two parents over a child, both bracket ends resolvable
pub const COUPLE_CHART: &str = "John      Jane\n/         \\\n     Mary";

/// Diagonal bracket drawn with the parents' slashes reversed
pub const REVERSED_CHART: &str = "Tom          Ann\n  \\          /\n    \\      /\n      Sam";

pub fn anchor(label: &str, color: &str) -> Anchor {
    Anchor::new(label).with_color(color)
}

/// A page whose anchors are `(label, color)` pairs
pub fn page(text: &str, anchors: &[(&str, &str)]) -> ExtractedPage {
    ExtractedPage::new(
        text,
        anchors.iter().map(|(label, color)| anchor(label, color)).collect(),
    )
}

pub fn couple_page() -> ExtractedPage {
    page(COUPLE_CHART, &[("John", "blue"), ("Jane", "red"), ("Mary", "red")])
}

pub fn reversed_page() -> ExtractedPage {
    page(REVERSED_CHART, &[("Tom", "blue"), ("Ann", "red"), ("Sam", "blue")])
}

pub fn parse(page: &ExtractedPage) -> Pedigree {
    pedigraph::parse_page(page, &ParseConfig::default())
}

pub fn id_of(pedigree: &Pedigree, name: &str) -> PersonId {
    pedigree
        .find_by_name(name)
        .map(|p| p.id)
        .unwrap_or_else(|| panic!("{name} not found"))
}

pub fn profile(kit: &str, name: &str, link: &str) -> ProfileRecord {
    ProfileRecord {
        kit: kit.to_string(),
        name: name.to_string(),
        ged_link: link.to_string(),
        email: format!("{}@example.org", kit.to_lowercase()),
        ..Default::default()
    }
}

/// Parent cap, no self links, symmetric spouses, unique family parent sets
pub fn assert_well_formed(pedigree: &Pedigree) {
    for person in &pedigree.people {
        assert!(person.parents.len() <= 2, "{} has too many parents", person.name);
        assert!(!person.parents.contains(&person.id), "{} is their own parent", person.name);
        if let Some(spouse) = person.spouse {
            assert_eq!(pedigree.people[spouse.index()].spouse, Some(person.id));
        }
        for child in &person.children {
            assert!(pedigree.people[child.index()].parents.contains(&person.id));
        }
    }
    let mut keys: Vec<_> = pedigree.families.iter().map(|f| f.key()).collect();
    let total = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), total, "duplicate family parent sets");
}
