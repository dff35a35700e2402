//! Typed rows of a pedigree chart

use crate::model::PersonId;
use serde::{Deserialize, Serialize};

/// Connector glyph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Glyph {
    Pipe,
    Slash,
    Backslash,
}

impl Glyph {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '|' => Some(Glyph::Pipe),
            '/' => Some(Glyph::Slash),
            '\\' => Some(Glyph::Backslash),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Glyph::Pipe => '|',
            Glyph::Slash => '/',
            Glyph::Backslash => '\\',
        }
    }
}

/// How the two glyphs of a bracket face each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOrientation {
    /// `/ ... \`
    Forward,
    /// `\ ... /`
    Reversed,
}

/// A `/` and `\` pair on one connector row.
///
/// `left < right` always holds; `orientation` says which glyph sits where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub left: usize,
    pub right: usize,
    pub mid: usize,
    pub orientation: SegmentOrientation,
}

impl Segment {
    pub fn new(left: usize, right: usize, orientation: SegmentOrientation) -> Self {
        Self {
            left,
            right,
            mid: (left + right) / 2,
            orientation,
        }
    }

    pub fn width(&self) -> usize {
        self.right - self.left
    }

    /// Strictly between the two glyphs
    pub fn spans(&self, column: isize) -> bool {
        (self.left as isize) < column && column < (self.right as isize)
    }

    /// Glyph positions as `(column, glyph)` pairs, left first
    pub fn endpoints(&self) -> [(usize, Glyph); 2] {
        match self.orientation {
            SegmentOrientation::Forward => [(self.left, Glyph::Slash), (self.right, Glyph::Backslash)],
            SegmentOrientation::Reversed => [(self.left, Glyph::Backslash), (self.right, Glyph::Slash)],
        }
    }
}

/// Pair slashes into candidate brackets.
///
/// Runs two greedy passes over the sorted glyph columns: every `/` claims the
/// nearest unclaimed `\` to its right, then every `\` claims the nearest
/// unclaimed `/` to its right. Both candidate sets are returned.
pub fn pair_segments(slashes: &[usize], backslashes: &[usize]) -> Vec<Segment> {
    let mut segments = greedy_pairs(slashes, backslashes, SegmentOrientation::Forward);
    segments.extend(greedy_pairs(backslashes, slashes, SegmentOrientation::Reversed));
    segments
}

fn greedy_pairs(openers: &[usize], closers: &[usize], orientation: SegmentOrientation) -> Vec<Segment> {
    let mut claimed = vec![false; closers.len()];
    let mut pairs = Vec::new();
    for &open in openers {
        let nearest = closers
            .iter()
            .enumerate()
            .filter(|(j, &close)| !claimed[*j] && close > open)
            .min_by_key(|(_, &close)| close);
        if let Some((j, &close)) = nearest {
            claimed[j] = true;
            pairs.push(Segment::new(open, close, orientation));
        }
    }
    pairs
}

/// A line holding one or more person labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRow {
    pub line_index: usize,
    pub persons: Vec<PersonId>,
    /// Glyphs outside the labels
    #[serde(default)]
    pub pipe_columns: Vec<usize>,
    #[serde(default)]
    pub left_slash_columns: Vec<usize>,
    #[serde(default)]
    pub right_slash_columns: Vec<usize>,
}

impl PersonRow {
    pub fn new(line_index: usize, persons: Vec<PersonId>, glyphs: &[(usize, Glyph)]) -> Self {
        let mut row = Self {
            line_index,
            persons,
            ..Default::default()
        };
        for &(column, glyph) in glyphs {
            match glyph {
                Glyph::Pipe => row.pipe_columns.push(column),
                Glyph::Slash => row.left_slash_columns.push(column),
                Glyph::Backslash => row.right_slash_columns.push(column),
            }
        }
        row
    }
}

/// A line of connector glyphs only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorRow {
    pub line_index: usize,
    pub pipe_columns: Vec<usize>,
    pub left_slash_columns: Vec<usize>,
    pub right_slash_columns: Vec<usize>,
    pub segments: Vec<Segment>,
}

impl ConnectorRow {
    pub fn new(line_index: usize, glyphs: &[(usize, Glyph)]) -> Self {
        let mut row = Self {
            line_index,
            ..Default::default()
        };
        for &(column, glyph) in glyphs {
            match glyph {
                Glyph::Pipe => row.pipe_columns.push(column),
                Glyph::Slash => row.left_slash_columns.push(column),
                Glyph::Backslash => row.right_slash_columns.push(column),
            }
        }
        row.segments = pair_segments(&row.left_slash_columns, &row.right_slash_columns);
        row
    }

    /// Narrowest segment that strictly contains `column`
    pub fn segment_spanning(&self, column: isize) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| s.spans(column))
            .min_by_key(|s| (s.width(), s.left))
    }

    /// Every `/` and `\` on the row, left to right
    pub fn slashes(&self) -> Vec<(usize, Glyph)> {
        let mut all: Vec<_> = self
            .left_slash_columns
            .iter()
            .map(|&c| (c, Glyph::Slash))
            .chain(self.right_slash_columns.iter().map(|&c| (c, Glyph::Backslash)))
            .collect();
        all.sort();
        all
    }
}

/// One meaningful line of the chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Row {
    Person(PersonRow),
    Connector(ConnectorRow),
}

impl Row {
    pub fn line_index(&self) -> usize {
        match self {
            Row::Person(row) => row.line_index,
            Row::Connector(row) => row.line_index,
        }
    }

    pub fn pipe_columns(&self) -> &[usize] {
        match self {
            Row::Person(row) => &row.pipe_columns,
            Row::Connector(row) => &row.pipe_columns,
        }
    }

    /// Nearest `|` within `tolerance` of `column`
    pub fn pipe_near(&self, column: isize, tolerance: usize) -> Option<usize> {
        self.pipe_columns()
            .iter()
            .copied()
            .filter(|&c| distance(c, column) <= tolerance)
            .min_by_key(|&c| (distance(c, column), c))
    }

    /// Nearest `/` or `\` within `tolerance` of `column`, paired or not
    pub fn slash_near(&self, column: isize, tolerance: usize) -> Option<(usize, Glyph)> {
        let (slashes, backslashes) = match self {
            Row::Person(row) => (&row.left_slash_columns, &row.right_slash_columns),
            Row::Connector(row) => (&row.left_slash_columns, &row.right_slash_columns),
        };
        slashes
            .iter()
            .map(|&c| (c, Glyph::Slash))
            .chain(backslashes.iter().map(|&c| (c, Glyph::Backslash)))
            .filter(|(c, _)| distance(*c, column) <= tolerance)
            .min_by_key(|(c, _)| (distance(*c, column), *c))
    }

    pub fn as_connector(&self) -> Option<&ConnectorRow> {
        match self {
            Row::Connector(row) => Some(row),
            Row::Person(_) => None,
        }
    }
}

/// Absolute distance between a glyph column and a possibly negative lane column
pub fn distance(column: usize, lane: isize) -> usize {
    (column as isize - lane).unsigned_abs()
}
