//! Vertical lane tracing across rows

use crate::config::ToleranceConfig;
use crate::model::{Person, PersonId};
use crate::tokenize::{distance, Glyph, PersonRow, Row};
use tracing::trace;

/// Which way a trace walks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Follows a lane from a starting row and column to the person it ends at.
///
/// Walks meaningful rows only. Inside a bracket the lane is bridged and the
/// bracket's span is remembered as a window, so the person match can land
/// anywhere under it. Pipes keep the column; slashes shift it diagonally.
pub struct Tracer<'a> {
    rows: &'a [Row],
    people: &'a [Person],
    tolerance: &'a ToleranceConfig,
    offset: usize,
}

impl<'a> Tracer<'a> {
    pub fn new(rows: &'a [Row], people: &'a [Person], tolerance: &'a ToleranceConfig, offset: usize) -> Self {
        Self {
            rows,
            people,
            tolerance,
            offset,
        }
    }

    pub fn offset(&self) -> isize {
        self.offset as isize
    }

    /// Trace with the default row budget
    pub fn trace(&self, start: usize, column: isize, direction: Direction) -> Option<PersonId> {
        self.trace_within(start, column, direction, self.tolerance.max_trace_rows)
    }

    /// Trace from the row after `start`, giving up after `max_rows` rows
    pub fn trace_within(
        &self,
        start: usize,
        column: isize,
        direction: Direction,
        max_rows: usize,
    ) -> Option<PersonId> {
        let mut column = column;
        let mut window: Option<(usize, usize)> = None;
        let mut index = start;

        for _ in 0..max_rows {
            index = match direction {
                Direction::Up => index.checked_sub(1)?,
                Direction::Down => Some(index + 1).filter(|&i| i < self.rows.len())?,
            };
            let row = &self.rows[index];

            match row {
                Row::Connector(connector) => {
                    if let Some(segment) = connector.segment_spanning(column) {
                        window = Some((segment.left, segment.right));
                        continue;
                    }
                }
                Row::Person(person_row) => {
                    if let Some(id) = self.match_person(person_row, column, window) {
                        trace!(row = index, column, person = %id, "trace reached person");
                        return Some(id);
                    }
                }
            }

            if row.pipe_near(column, self.tolerance.column_tolerance).is_some() {
                continue;
            }
            if let Some((glyph_column, glyph)) = row.slash_near(column, self.tolerance.column_tolerance) {
                column = self.shift(glyph_column, glyph, direction);
                continue;
            }

            trace!(row = index, column, "trace lost the lane");
            return None;
        }
        None
    }

    /// Nearest person under the column, or under the remembered window
    fn match_person(&self, row: &PersonRow, column: isize, window: Option<(usize, usize)>) -> Option<PersonId> {
        let reach = self.tolerance.person_tolerance;
        let in_window = |col: usize| window.map_or(false, |(left, right)| col + reach >= left && col <= right + reach);

        row.persons
            .iter()
            .copied()
            .filter(|id| {
                let col = self.people[id.index()].column;
                distance(col, column) <= reach || in_window(col)
            })
            .min_by_key(|id| (distance(self.people[id.index()].column, column), *id))
    }

    /// `\` leans right going down, `/` leans left going down
    fn shift(&self, glyph_column: usize, glyph: Glyph, direction: Direction) -> isize {
        let glyph_column = glyph_column as isize;
        match (glyph, direction) {
            (Glyph::Backslash, Direction::Down) | (Glyph::Slash, Direction::Up) => glyph_column + self.offset(),
            _ => glyph_column - self.offset(),
        }
    }
}
