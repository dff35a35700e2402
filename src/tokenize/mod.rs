//! Row tokenizer
//!
//! Turns the raw chart text and its anchors into typed rows. A line that
//! holds a person label becomes a [`Row::Person`]; a line holding only
//! `|`, `/` or `\` glyphs becomes a [`Row::Connector`] with its candidate
//! bracket segments. Blank lines and lines with neither are dropped.

mod html;
mod row;

pub use html::anchors_from_html;
pub use row::{distance, pair_segments, ConnectorRow, Glyph, PersonRow, Row, Segment, SegmentOrientation};

use crate::config::ParseConfig;
use crate::label::parse_label;
use crate::model::{Anchor, ExtractedPage, Person, PersonId};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::ops::Range;
use tracing::{debug, trace};
use unicode_normalization::UnicodeNormalization;

/// An anchor without letters, such as an expand-subtree link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMarker {
    pub line_index: usize,
    pub column: usize,
    pub label: String,
    #[serde(default)]
    pub href: String,
}

/// Line counts gathered while tokenizing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total_lines: usize,
    pub blank_lines: usize,
    pub person_rows: usize,
    pub connector_rows: usize,
    pub dropped_lines: usize,
    /// Anchors whose label never appeared in the text
    pub unmatched_anchors: usize,
}

/// Tokenizer output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tokenized {
    pub rows: Vec<Row>,
    pub people: Vec<Person>,
    pub controls: Vec<ControlMarker>,
    pub stats: TokenStats,
}

impl Tokenized {
    /// Label columns of every person, in discovery order
    pub fn person_columns(&self) -> Vec<usize> {
        self.people.iter().map(|p| p.column).collect()
    }
}

/// NFC, non-breaking spaces as plain spaces
pub fn normalize_text(text: &str) -> String {
    text.nfc()
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect()
}

/// Tokenize a page.
///
/// Falls back to anchors recovered from `page.html` when the page carries
/// no anchor list.
pub fn tokenize(page: &ExtractedPage, config: &ParseConfig) -> Tokenized {
    let anchors: Cow<'_, [Anchor]> = if page.anchors.is_empty() && !page.html.is_empty() {
        Cow::Owned(anchors_from_html(&page.html))
    } else {
        Cow::Borrowed(&page.anchors)
    };
    let labels: Vec<String> = anchors
        .iter()
        .map(|a| normalize_text(&a.label).trim().to_string())
        .collect();
    let mut consumed = vec![false; anchors.len()];

    let text = normalize_text(&page.text);
    let mut out = Tokenized::default();

    for (line_index, line) in text.lines().enumerate() {
        out.stats.total_lines += 1;
        if line.trim().is_empty() {
            out.stats.blank_lines += 1;
            continue;
        }

        let mut claimed: Vec<Range<usize>> = Vec::new();
        let mut persons = Vec::new();

        for (i, anchor) in anchors.iter().enumerate() {
            let label = &labels[i];
            if consumed[i] || label.is_empty() {
                continue;
            }
            let Some(start) = find_free_span(line, label, &claimed) else {
                continue;
            };
            consumed[i] = true;
            claimed.push(start..start + label.len());
            let column = line[..start].chars().count();

            if !label.chars().any(char::is_alphabetic) {
                trace!(line = line_index, column, label = %label, "control marker");
                out.controls.push(ControlMarker {
                    line_index,
                    column,
                    label: label.clone(),
                    href: anchor.href.clone(),
                });
                continue;
            }

            let parsed = parse_label(label);
            let id = PersonId::new(out.people.len());
            let sex = config.sex_colors.sex_for(&anchor.color);
            let mut person = Person::new(id, parsed.name, sex)
                .at(line_index, column)
                .with_birth(parsed.birth)
                .with_death(parsed.death);
            if let Some(url) = config.links.resolve(&anchor.href) {
                person = person.with_url(url);
            }
            debug!(id = %id, line = line_index, column, name = %person.name, "person label");
            out.people.push(person);
            persons.push(id);
        }

        let glyphs = scan_glyphs(line, &claimed);
        if !persons.is_empty() {
            out.stats.person_rows += 1;
            out.rows.push(Row::Person(PersonRow::new(line_index, persons, &glyphs)));
        } else if !glyphs.is_empty() {
            out.stats.connector_rows += 1;
            out.rows.push(Row::Connector(ConnectorRow::new(line_index, &glyphs)));
        } else {
            out.stats.dropped_lines += 1;
        }
    }

    out.stats.unmatched_anchors = consumed
        .iter()
        .zip(&labels)
        .filter(|(used, label)| !**used && !label.is_empty())
        .count();
    debug!(
        rows = out.rows.len(),
        people = out.people.len(),
        controls = out.controls.len(),
        unmatched = out.stats.unmatched_anchors,
        "tokenized chart"
    );
    out
}

/// Byte offset of the first occurrence of `label` not overlapping `claimed`
fn find_free_span(line: &str, label: &str, claimed: &[Range<usize>]) -> Option<usize> {
    line.match_indices(label).map(|(start, _)| start).find(|&start| {
        let end = start + label.len();
        claimed.iter().all(|r| end <= r.start || start >= r.end)
    })
}

/// Connector glyphs outside claimed label spans, with character columns
fn scan_glyphs(line: &str, claimed: &[Range<usize>]) -> Vec<(usize, Glyph)> {
    line.char_indices()
        .enumerate()
        .filter(|(_, (byte, _))| !claimed.iter().any(|r| r.contains(byte)))
        .filter_map(|(column, (_, c))| Glyph::from_char(c).map(|g| (column, g)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sex;

    fn anchor(label: &str, color: &str) -> Anchor {
        Anchor::new(label).with_color(color)
    }

    #[test]
    fn two_anchors_on_one_line() {
        let page = ExtractedPage::new(
            "Ann Lee        Bob Lee",
            vec![anchor("Ann Lee", "red"), anchor("Bob Lee", "blue")],
        );
        let out = tokenize(&page, &ParseConfig::default());
        assert_eq!(out.people.len(), 2);
        assert_eq!(out.people[0].column, 0);
        assert_eq!(out.people[1].column, 15);
        assert_eq!(out.people[0].sex, Sex::Female);
        assert_eq!(out.people[1].sex, Sex::Male);
        assert_eq!(out.rows.len(), 1);
        match &out.rows[0] {
            Row::Person(row) => assert_eq!(row.persons.len(), 2),
            other => panic!("expected person row, got {other:?}"),
        }
    }

    #[test]
    fn repeated_label_is_consumed_once_per_anchor() {
        let page = ExtractedPage::new(
            "Ann\n |\nAnn\n",
            vec![anchor("Ann", "red"), anchor("Ann", "red")],
        );
        let out = tokenize(&page, &ParseConfig::default());
        let lines: Vec<_> = out.people.iter().map(|p| p.line_index).collect();
        assert_eq!(lines, vec![0, 2]);
    }

    #[test]
    fn identical_labels_on_one_line_claim_distinct_spans() {
        let page = ExtractedPage::new("Ann   Ann", vec![anchor("Ann", ""), anchor("Ann", "")]);
        let out = tokenize(&page, &ParseConfig::default());
        let columns: Vec<_> = out.people.iter().map(|p| p.column).collect();
        assert_eq!(columns, vec![0, 6]);
    }

    #[test]
    fn letterless_anchor_is_a_control_marker() {
        let page = ExtractedPage::new(
            "Tom  [+]\n  |",
            vec![anchor("Tom", "blue"), Anchor::new("[+]").with_href("/expand/1")],
        );
        let out = tokenize(&page, &ParseConfig::default());
        assert_eq!(out.people.len(), 1);
        assert_eq!(out.controls.len(), 1);
        assert_eq!(out.controls[0].column, 5);
        assert_eq!(out.controls[0].href, "/expand/1");
    }

    #[test]
    fn classifies_and_counts_lines() {
        let page = ExtractedPage::new(
            "random\ngarbage\n\n/\\\n",
            vec![],
        );
        let out = tokenize(&page, &ParseConfig::default());
        assert!(out.people.is_empty());
        assert_eq!(out.stats.total_lines, 4);
        assert_eq!(out.stats.blank_lines, 1);
        assert_eq!(out.stats.dropped_lines, 2);
        assert_eq!(out.stats.connector_rows, 1);
        let connector = out.rows[0].as_connector().unwrap();
        assert_eq!(connector.line_index, 3);
        assert_eq!(connector.segments, vec![Segment::new(0, 1, SegmentOrientation::Forward)]);
    }

    #[test]
    fn columns_count_characters_and_nbsp_is_space() {
        let page = ExtractedPage::new(
            "Zoë\u{a0}Ó   Ann",
            vec![anchor("Zoë Ó", "red"), anchor("Ann", "red")],
        );
        let out = tokenize(&page, &ParseConfig::default());
        assert_eq!(out.people[0].name, "Zoë Ó");
        assert_eq!(out.people[1].column, 8);
    }

    #[test]
    fn slashes_inside_labels_are_not_glyphs() {
        let page = ExtractedPage::new("|  Smith/Jones", vec![anchor("Smith/Jones", "")]);
        let out = tokenize(&page, &ParseConfig::default());
        match &out.rows[0] {
            Row::Person(row) => assert_eq!(row.pipe_columns, vec![0]),
            other => panic!("expected person row, got {other:?}"),
        }
    }

    #[test]
    fn hrefs_resolve_and_html_anchors_are_a_fallback() {
        let page = ExtractedPage {
            text: "Tom Hill\n   |".into(),
            html: r#"<a href="/ind?id=4"><font color="blue">Tom Hill</font></a>"#.into(),
            anchors: vec![],
        };
        let out = tokenize(&page, &ParseConfig::default());
        assert_eq!(out.people[0].sex, Sex::Male);
        assert_eq!(
            out.people[0].url.as_deref(),
            Some("https://pro.gedmatch.com/ind?id=4")
        );
    }

    #[test]
    fn unmatched_anchors_are_counted() {
        let page = ExtractedPage::new("Tom", vec![anchor("Tom", ""), anchor("Nobody", "")]);
        let out = tokenize(&page, &ParseConfig::default());
        assert_eq!(out.stats.unmatched_anchors, 1);
    }
}
