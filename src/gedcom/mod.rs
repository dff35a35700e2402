//! GEDCOM 5.5.1 export
//!
//! Writes a lineage-linked document: header, submitter, one `INDI` per
//! person, one `FAM` per family, trailer. Pointers are derived from vector
//! positions (`@I1@`, `@F1@`, ...). Site-specific data goes into `_OM_*`
//! extension tags.

mod meta;

pub use meta::ExportMeta;

use crate::model::{DateFact, Family, Pedigree, Person, PersonId, Sex};
use tracing::debug;

/// GEDCOM version written into the header
pub const GEDCOM_VERSION: &str = "5.5.1";

const SUBMITTER: &str = "@SUB1@";
const SEGMENT_BUILD: &str = "37";

fn indi_ptr(id: PersonId) -> String {
    format!("@I{}@", id.index() + 1)
}

fn fam_ptr(index: usize) -> String {
    format!("@F{}@", index + 1)
}

/// Format a kit display name for the root `NAME` line.
///
/// A leading `*` marks a name that is already in GEDCOM form. Otherwise the
/// last word is taken as the surname: `Jane Q Public` becomes
/// `Jane Q /Public/`.
pub fn format_root_name(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(verbatim) = raw.strip_prefix('*') {
        return verbatim.trim().to_string();
    }
    let words: Vec<&str> = raw.split_whitespace().collect();
    match words.split_last() {
        None => String::new(),
        Some((surname, [])) => format!("/{surname}/"),
        Some((surname, given)) => format!("{} /{}/", given.join(" "), surname),
    }
}

/// HUSB and WIFE for a family's parent set
fn roles(family: &Family, people: &[Person]) -> (Option<PersonId>, Option<PersonId>) {
    let sex = |id: PersonId| people[id.index()].sex;
    match family.parents.as_slice() {
        [a, b] => {
            let (a, b) = (*a, *b);
            if sex(a) == Sex::Male || sex(b) == Sex::Female {
                (Some(a), Some(b))
            } else if sex(b) == Sex::Male || sex(a) == Sex::Female {
                (Some(b), Some(a))
            } else {
                (Some(a), Some(b))
            }
        }
        [only] if sex(*only) == Sex::Female => (None, Some(*only)),
        [only] => (Some(*only), None),
        _ => (None, None),
    }
}

/// Strip line breaks and double every `@`; GEDCOM values are single-line
/// and a lone `@` would read as a pointer
fn value(text: &str) -> String {
    text.split(|c| c == '\r' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('@', "@@")
}

/// Serializes a [`Pedigree`] to GEDCOM text
pub struct GedcomWriter<'a> {
    meta: &'a ExportMeta,
    lines: Vec<String>,
}

impl<'a> GedcomWriter<'a> {
    pub fn new(meta: &'a ExportMeta) -> Self {
        Self {
            meta,
            lines: Vec::new(),
        }
    }

    fn line(&mut self, level: u8, tag: &str, text: Option<&str>) {
        match text.map(value) {
            Some(text) if !text.is_empty() => self.lines.push(format!("{level} {tag} {text}")),
            Some(_) => {}
            None => self.lines.push(format!("{level} {tag}")),
        }
    }

    /// Write `text` under `tag` only when it is non-empty
    fn field(&mut self, level: u8, tag: &str, text: &str) {
        self.line(level, tag, Some(text));
    }

    /// Write a cross-reference pointer, which is never escaped
    fn pointer(&mut self, level: u8, tag: &str, ptr: &str) {
        self.lines.push(format!("{level} {tag} {ptr}"));
    }

    /// Render the whole document, newline terminated
    pub fn write(mut self, pedigree: &Pedigree) -> String {
        let root = pedigree.root().map(|p| p.id);
        let families: Vec<_> = pedigree
            .families
            .iter()
            .map(|f| (f, roles(f, &pedigree.people)))
            .collect();

        self.header();
        for person in &pedigree.people {
            self.individual(person, root == Some(person.id));
            for (index, (family, (husband, wife))) in families.iter().enumerate() {
                if family.children.contains(&person.id) {
                    self.pointer(1, "FAMC", &fam_ptr(index));
                }
                if *husband == Some(person.id) || *wife == Some(person.id) {
                    self.pointer(1, "FAMS", &fam_ptr(index));
                }
            }
        }
        for (index, (family, (husband, wife))) in families.iter().enumerate() {
            self.family(index, family, *husband, *wife);
        }
        self.line(0, "TRLR", None);

        debug!(
            people = pedigree.people.len(),
            families = pedigree.families.len(),
            lines = self.lines.len(),
            "wrote gedcom"
        );
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn header(&mut self) {
        let meta = self.meta;
        self.line(0, "HEAD", None);
        self.field(1, "SOUR", &meta.source_name);
        self.field(2, "NAME", &format!("{} {} Capture", meta.source_name, meta.site_label));
        self.field(2, "VERS", crate::VERSION);
        if let Some(date) = meta.export_date {
            self.field(1, "DATE", &date.format("%-d %b %Y").to_string().to_uppercase());
        }
        self.pointer(1, "SUBM", SUBMITTER);
        self.line(1, "GEDC", None);
        self.field(2, "VERS", GEDCOM_VERSION);
        self.field(2, "FORM", "LINEAGE-LINKED");
        self.field(1, "CHAR", "UTF-8");
        if let Some(kit) = &meta.kit {
            self.field(1, "_OM_REFERENCE_KIT", kit);
        }
        self.lines.push(format!("0 {SUBMITTER} SUBM"));
        self.field(1, "NAME", &meta.source_name);
    }

    fn individual(&mut self, person: &Person, is_root: bool) {
        let meta = self.meta;
        self.lines.push(format!("0 {} INDI", indi_ptr(person.id)));

        let override_name = meta
            .root_name_override
            .as_deref()
            .filter(|_| is_root)
            .map(format_root_name)
            .filter(|n| !n.is_empty());
        let name = match override_name {
            Some(name) => name,
            None if person.name.trim().is_empty() => "Unknown".to_string(),
            None => person.name.clone(),
        };
        self.field(1, "NAME", &name);
        self.field(1, "SEX", person.sex.code());
        self.event("BIRT", person.birth.as_ref());
        self.event("DEAT", person.death.as_ref());
        if let Some(url) = &person.url {
            self.field(1, "_OM_SOURCE_URL", url);
        }

        if !is_root {
            return;
        }
        if let Some(kit) = &meta.kit {
            self.field(1, "_OM_KIT_ID", kit);
            self.field(1, "_OM_KIT_SITE", &meta.site_label);
            if let Some(email) = meta.kit_email() {
                self.field(1, "_OM_SUBMITTER_EMAIL", email);
            }
        }
        if let Some(total) = &meta.total_cm {
            self.field(1, "_OM_ATDNA_TOTAL", total);
        }
        let segments = meta.kit.as_deref().map(|k| meta.segments.for_kit(k)).unwrap_or(&[]);
        for segment in segments {
            self.line(1, "_OM_SEGMENT", None);
            self.field(2, "_OM_MATCH_KIT", &segment.matched_kit);
            self.field(2, "_OM_MATCH_NAME", &segment.matched_name);
            self.field(2, "_OM_CHR", &segment.chr);
            self.field(2, "_OM_BUILD", SEGMENT_BUILD);
            self.field(2, "_OM_START", &segment.b37_start);
            self.field(2, "_OM_END", &segment.b37_end);
            self.field(2, "_OM_CM", &segment.cm);
            self.field(2, "_OM_SNPS", &segment.snps);
        }
    }

    fn event(&mut self, tag: &str, fact: Option<&DateFact>) {
        let Some(fact) = fact.filter(|f| !f.is_empty()) else {
            return;
        };
        self.line(1, tag, None);
        if let Some(date) = &fact.date {
            self.field(2, "DATE", date);
        }
        if let Some(place) = &fact.place {
            self.field(2, "PLAC", place);
        }
    }

    fn family(&mut self, index: usize, family: &Family, husband: Option<PersonId>, wife: Option<PersonId>) {
        self.lines.push(format!("0 {} FAM", fam_ptr(index)));
        if let Some(husband) = husband {
            self.pointer(1, "HUSB", &indi_ptr(husband));
        }
        if let Some(wife) = wife {
            self.pointer(1, "WIFE", &indi_ptr(wife));
        }
        for &child in &family.children {
            self.pointer(1, "CHIL", &indi_ptr(child));
        }
    }
}

/// Render `pedigree` as GEDCOM with the given metadata
pub fn to_gedcom(pedigree: &Pedigree, meta: &ExportMeta) -> String {
    GedcomWriter::new(meta).write(pedigree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SegmentIndex, SegmentRecord};
    use chrono::NaiveDate;

    fn person(id: usize, name: &str, sex: Sex) -> Person {
        Person::new(PersonId::new(id), name, sex)
    }

    fn couple_with_child(sex_a: Sex, sex_b: Sex) -> Pedigree {
        let mut family = Family::new(vec![PersonId::new(1), PersonId::new(2)]);
        family.add_child(PersonId::new(0));
        Pedigree {
            people: vec![
                person(0, "Kid", Sex::Unknown),
                person(1, "A", sex_a),
                person(2, "B", sex_b),
            ],
            families: vec![family],
            logs: vec![],
        }
    }

    #[test]
    fn minimal_document() {
        let pedigree = Pedigree {
            people: vec![person(0, "A /B/", Sex::Male)],
            ..Default::default()
        };
        let ged = to_gedcom(&pedigree, &ExportMeta::default());
        let lines: Vec<_> = ged.lines().collect();

        assert_eq!(lines[0], "0 HEAD");
        let indi = lines.iter().position(|l| *l == "0 @I1@ INDI").unwrap();
        assert_eq!(lines[indi + 1], "1 NAME A /B/");
        assert_eq!(lines[indi + 2], "1 SEX M");
        assert_eq!(lines.last(), Some(&"0 TRLR"));
        assert!(ged.ends_with("0 TRLR\n"));
        assert!(lines.contains(&"2 VERS 5.5.1"));
        assert!(lines.contains(&"0 @SUB1@ SUBM"));
        assert!(!ged.contains("_OM_REFERENCE_KIT"));
        assert!(!ged.contains("1 DATE"));
    }

    #[test]
    fn root_name_formats() {
        assert_eq!(format_root_name("Jane Q Public"), "Jane Q /Public/");
        assert_eq!(format_root_name("*Jane /Public/ Jr"), "Jane /Public/ Jr");
        assert_eq!(format_root_name("Cher"), "/Cher/");
        assert_eq!(format_root_name("   "), "");
    }

    #[test]
    fn roles_follow_sex() {
        let ged = to_gedcom(&couple_with_child(Sex::Female, Sex::Unknown), &ExportMeta::default());
        assert!(ged.contains("1 HUSB @I3@\n1 WIFE @I2@\n1 CHIL @I1@"));

        let ged = to_gedcom(&couple_with_child(Sex::Unknown, Sex::Unknown), &ExportMeta::default());
        assert!(ged.contains("1 HUSB @I2@\n1 WIFE @I3@"));

        let ged = to_gedcom(&couple_with_child(Sex::Unknown, Sex::Male), &ExportMeta::default());
        assert!(ged.contains("1 HUSB @I3@\n1 WIFE @I2@"));
    }

    #[test]
    fn single_parent_roles() {
        let mut family = Family::new(vec![PersonId::new(1)]);
        family.add_child(PersonId::new(0));
        let mut pedigree = Pedigree {
            people: vec![person(0, "Kid", Sex::Male), person(1, "Mom", Sex::Female)],
            families: vec![family],
            logs: vec![],
        };
        let ged = to_gedcom(&pedigree, &ExportMeta::default());
        assert!(ged.contains("0 @F1@ FAM\n1 WIFE @I2@\n1 CHIL @I1@"));

        pedigree.people[1].sex = Sex::Unknown;
        let ged = to_gedcom(&pedigree, &ExportMeta::default());
        assert!(ged.contains("0 @F1@ FAM\n1 HUSB @I2@\n1 CHIL @I1@"));
    }

    #[test]
    fn back_references_follow_each_individual() {
        let ged = to_gedcom(&couple_with_child(Sex::Male, Sex::Female), &ExportMeta::default());
        assert!(ged.contains("0 @I1@ INDI\n1 NAME Kid\n1 SEX U\n1 FAMC @F1@\n0 @I2@ INDI"));
        assert!(ged.contains("0 @I2@ INDI\n1 NAME A\n1 SEX M\n1 FAMS @F1@"));
        assert!(ged.contains("0 @I3@ INDI\n1 NAME B\n1 SEX F\n1 FAMS @F1@"));
    }

    #[test]
    fn events_and_source_urls() {
        let kid = person(0, "Kid", Sex::Male)
            .with_url("https://pro.gedmatch.com/i/1")
            .with_birth(DateFact {
                date: Some("3 JAN 1920".into()),
                place: Some("Dallas".into()),
            })
            .with_death(DateFact {
                date: Some("1999".into()),
                place: None,
            });
        let pedigree = Pedigree {
            people: vec![kid],
            ..Default::default()
        };
        let ged = to_gedcom(&pedigree, &ExportMeta::default());
        assert!(ged.contains(
            "1 BIRT\n2 DATE 3 JAN 1920\n2 PLAC Dallas\n1 DEAT\n2 DATE 1999\n1 _OM_SOURCE_URL https://pro.gedmatch.com/i/1\n"
        ));
    }

    #[test]
    fn root_carries_kit_extensions() {
        let mut pedigree = couple_with_child(Sex::Male, Sex::Female);
        pedigree.people[1].indent_level = 1;
        pedigree.people[2].indent_level = 1;
        let segments = SegmentIndex::from_records(&[SegmentRecord {
            primary_kit: "A1".into(),
            matched_kit: "M9".into(),
            matched_name: "Match".into(),
            chr: "7".into(),
            b37_start: "100".into(),
            b37_end: "900".into(),
            cm: "12.5".into(),
            snps: "1400".into(),
            ..Default::default()
        }]);
        let meta = ExportMeta::default()
            .with_kit("A1")
            .with_root_name("Jane Q Public")
            .with_email("A1", "jane@example.org")
            .with_total_cm("3400")
            .with_segments(segments)
            .with_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        let ged = to_gedcom(&pedigree, &meta);

        assert!(ged.contains("1 DATE 5 MAR 2024\n"));
        assert!(ged.contains("1 CHAR UTF-8\n1 _OM_REFERENCE_KIT A1\n"));
        assert!(ged.contains(
            "0 @I1@ INDI\n1 NAME Jane Q /Public/\n1 SEX U\n1 _OM_KIT_ID A1\n1 _OM_KIT_SITE GEDmatch\n1 _OM_SUBMITTER_EMAIL jane@@example.org\n1 _OM_ATDNA_TOTAL 3400\n1 _OM_SEGMENT\n2 _OM_MATCH_KIT M9\n2 _OM_MATCH_NAME Match\n2 _OM_CHR 7\n2 _OM_BUILD 37\n2 _OM_START 100\n2 _OM_END 900\n2 _OM_CM 12.5\n2 _OM_SNPS 1400\n1 FAMC @F1@\n"
        ));
        assert_eq!(ged.matches("_OM_KIT_ID").count(), 1);
        assert!(ged.contains("0 @I2@ INDI\n1 NAME A\n"));
    }

    #[test]
    fn empty_names_become_unknown() {
        let pedigree = Pedigree {
            people: vec![person(0, "  ", Sex::Unknown)],
            ..Default::default()
        };
        let ged = to_gedcom(&pedigree, &ExportMeta::default().with_root_name("   "));
        assert!(ged.contains("1 NAME Unknown\n"));
    }

    #[test]
    fn multi_line_values_are_flattened() {
        let pedigree = Pedigree {
            people: vec![person(0, "Ann\nLee", Sex::Female)],
            ..Default::default()
        };
        let ged = to_gedcom(&pedigree, &ExportMeta::default());
        assert!(ged.contains("1 NAME Ann Lee\n"));
    }

    #[test]
    fn at_signs_in_values_are_doubled() {
        let pedigree = couple_with_child(Sex::Male, Sex::Female);
        let meta = ExportMeta::default().with_kit("A1").with_email("A1", "kid@home.test");
        let ged = to_gedcom(&pedigree, &meta);

        assert!(ged.contains("1 _OM_SUBMITTER_EMAIL kid@@home.test\n"));
        assert!(ged.contains("1 SUBM @SUB1@\n"));
        assert!(ged.contains("0 @F1@ FAM\n1 HUSB @I2@\n1 WIFE @I3@\n1 CHIL @I1@\n"));
        assert!(!ged.contains("@@I"));
    }
}
