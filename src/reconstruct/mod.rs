//! Graph reconstruction
//!
//! Reads parent/child edges out of the connector art between person rows.
//! Three passes feed one edge set:
//!
//! 1. Bracket segments, narrowest first, each read in whichever orientation
//!    reaches more people from its two ends.
//! 2. Slashes no accepted bracket used, as single-parent edges.
//! 3. Runs of `|`, joining the people at either end by indent level.
//!
//! The edge set is then capped at two parents per child and grouped into
//! families. The result depends only on the tokenized input.

mod normalize;
mod trace;


pub use trace::{Direction, Tracer};

use crate::config::ToleranceConfig;
use crate::indent::IndentScale;
use crate::model::{LogEntry, Orientation, Pedigree, Person, PersonId};
use crate::tokenize::{Glyph, Row, Segment, Tokenized};
use normalize::EdgeSet;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// One orientation's reading of a bracket
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reading {
    orientation: Orientation,
    parents: Vec<PersonId>,
    child: PersonId,
    /// Parents reached from the bracket's own ends rather than the fallback
    end_parents: usize,
}

/// Rebuilds the family graph from tokenized rows
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    tolerance: ToleranceConfig,
}

impl Reconstructor {
    pub fn new(tolerance: ToleranceConfig) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> &ToleranceConfig {
        &self.tolerance
    }

    /// Quantize indents and reconstruct the pedigree
    pub fn run(&self, tokenized: Tokenized) -> Pedigree {
        let scale = IndentScale::from_columns(&tokenized.person_columns(), &self.tolerance);
        self.run_with_scale(tokenized, &scale)
    }

    /// Reconstruct using a precomputed indent scale
    pub fn run_with_scale(&self, tokenized: Tokenized, scale: &IndentScale) -> Pedigree {
        let Tokenized {
            rows,
            mut people,
            controls,
            ..
        } = tokenized;
        scale.apply(&mut people);

        let mut logs = Vec::new();
        for person in &people {
            logs.push(LogEntry::PersonFound {
                id: person.id,
                name: person.name.clone(),
                row: person.line_index,
                column: person.column,
            });
        }
        for marker in controls {
            logs.push(LogEntry::ControlMarker {
                row: marker.line_index,
                column: marker.column,
                label: marker.label,
            });
        }
        logs.push(LogEntry::IndentScale {
            min_column: scale.min_column,
            step: scale.step,
        });

        let offset = self.tolerance.offset(scale.step);
        let mut edges = EdgeSet::new(people.len());
        {
            let tracer = Tracer::new(&rows, &people, &self.tolerance, offset);
            let used = self.resolve_segments(&tracer, &rows, &mut edges, &mut logs);
            self.resolve_slashes(&tracer, &rows, &used, &mut edges, &mut logs);
            self.bridge_lanes(&tracer, &rows, &people, &mut edges, &mut logs);
        }

        let mut parents = edges.into_parents();
        normalize::limit_parents(&mut parents, &people, &mut logs);
        normalize::assign_relations(&mut people, parents);
        let families = normalize::materialize_families(&mut people, &mut logs);

        info!(people = people.len(), families = families.len(), "reconstructed pedigree");
        logs.push(LogEntry::Summary {
            people: people.len(),
            families: families.len(),
        });

        Pedigree {
            people,
            families,
            logs,
        }
    }

    /// Accept brackets narrowest first; returns the glyphs they consumed
    fn resolve_segments(
        &self,
        tracer: &Tracer<'_>,
        rows: &[Row],
        edges: &mut EdgeSet,
        logs: &mut Vec<LogEntry>,
    ) -> BTreeSet<(usize, usize)> {
        let mut candidates: Vec<(usize, Segment)> = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| row.as_connector().map(|c| (index, c)))
            .flat_map(|(index, c)| c.segments.iter().map(move |s| (index, *s)))
            .collect();
        candidates.sort_by_key(|(index, s)| (s.width(), *index, s.left, s.right));

        let mut used = BTreeSet::new();
        for (index, segment) in candidates {
            let line = rows[index].line_index();
            let reject = |reason: &str, logs: &mut Vec<LogEntry>| {
                debug!(row = line, left = segment.left, right = segment.right, reason, "segment rejected");
                logs.push(LogEntry::SegmentRejected {
                    row: line,
                    left: segment.left,
                    right: segment.right,
                    reason: reason.to_string(),
                });
            };

            if segment
                .endpoints()
                .iter()
                .any(|(column, _)| used.contains(&(index, *column)))
            {
                reject("glyph already used by a narrower bracket", logs);
                continue;
            }

            let Some(reading) = self.read_segment(tracer, index, &segment) else {
                reject("no child with a parent on either side", logs);
                continue;
            };

            for (column, _) in segment.endpoints() {
                used.insert((index, column));
            }
            for &parent in &reading.parents {
                edges.link(reading.child, parent, logs);
            }
            debug!(
                row = line,
                left = segment.left,
                right = segment.right,
                child = %reading.child,
                parents = ?reading.parents,
                "segment accepted"
            );
            logs.push(LogEntry::SegmentAccepted {
                row: line,
                left: segment.left,
                right: segment.right,
                orientation: reading.orientation,
                parents: reading.parents,
                child: reading.child,
            });
        }
        used
    }

    /// Score both orientations and keep the better one.
    ///
    /// Both readings are always computed; this is not a fallback chain.
    /// Parents-below wins only when it reaches strictly more parents from
    /// the bracket's own ends, so ties and failures of the mirrored reading
    /// keep parents-above.
    fn read_segment(&self, tracer: &Tracer<'_>, index: usize, segment: &Segment) -> Option<Reading> {
        let above = self.read_orientation(tracer, index, segment, Orientation::ParentsAbove);
        let below = self.read_orientation(tracer, index, segment, Orientation::ParentsBelow);
        match (above, below) {
            (Some(a), Some(b)) if b.end_parents > a.end_parents => Some(b),
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }

    fn read_orientation(
        &self,
        tracer: &Tracer<'_>,
        index: usize,
        segment: &Segment,
        orientation: Orientation,
    ) -> Option<Reading> {
        let (toward_parents, toward_child) = match orientation {
            Orientation::ParentsAbove => (Direction::Up, Direction::Down),
            Orientation::ParentsBelow => (Direction::Down, Direction::Up),
        };
        let mid = segment.mid as isize;
        let offset = tracer.offset();

        let child = tracer
            .trace(index, mid, toward_child)
            .or_else(|| tracer.trace(index, mid - offset, toward_child))?;

        let mut parents = Vec::new();
        for end in [segment.left, segment.right] {
            if let Some(parent) = tracer.trace(index, end as isize, toward_parents) {
                if parent != child && !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
        }
        let end_parents = parents.len();
        if parents.is_empty() {
            let parent = tracer.trace(index, mid + offset, toward_parents)?;
            if parent == child {
                return None;
            }
            parents.push(parent);
        }

        Some(Reading {
            orientation,
            parents,
            child,
            end_parents,
        })
    }

    /// Resolve every slash no accepted bracket consumed as a single-parent edge
    fn resolve_slashes(
        &self,
        tracer: &Tracer<'_>,
        rows: &[Row],
        used: &BTreeSet<(usize, usize)>,
        edges: &mut EdgeSet,
        logs: &mut Vec<LogEntry>,
    ) {
        let offset = tracer.offset();
        for (index, row) in rows.iter().enumerate() {
            let Some(connector) = row.as_connector() else {
                continue;
            };
            for (column, glyph) in connector.slashes() {
                if used.contains(&(index, column)) {
                    continue;
                }
                let (toward_parent, toward_child) = match glyph {
                    Glyph::Slash => (Direction::Up, Direction::Down),
                    Glyph::Backslash => (Direction::Down, Direction::Up),
                    Glyph::Pipe => continue,
                };
                let col = column as isize;
                let parent = tracer
                    .trace(index, col, toward_parent)
                    .or_else(|| tracer.trace(index, col + offset, toward_parent));
                let child = tracer
                    .trace(index, col - offset, toward_child)
                    .or_else(|| tracer.trace(index, col, toward_child));

                let line = row.line_index();
                match (parent, child) {
                    (Some(parent), Some(child)) if parent != child => {
                        if edges.link(child, parent, logs) {
                            debug!(row = line, column, child = %child, parent = %parent, "slash accepted");
                            logs.push(LogEntry::SlashAccepted {
                                row: line,
                                column,
                                glyph: glyph.as_char(),
                                parent,
                                child,
                            });
                        }
                    }
                    _ => {
                        let reason = match (parent, child) {
                            (None, None) => "neither end reaches a person",
                            (None, _) => "no parent",
                            (_, None) => "no child",
                            _ => "both ends reach the same person",
                        };
                        debug!(row = line, column, reason, "slash rejected");
                        logs.push(LogEntry::SlashRejected {
                            row: line,
                            column,
                            glyph: glyph.as_char(),
                            reason: reason.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Walk each maximal run of pipes once and join its two ends by indent
    fn bridge_lanes(
        &self,
        tracer: &Tracer<'_>,
        rows: &[Row],
        people: &[Person],
        edges: &mut EdgeSet,
        logs: &mut Vec<LogEntry>,
    ) {
        let reach = self.tolerance.column_tolerance;
        let steps = self.tolerance.max_pipe_bridge_steps;

        for (index, row) in rows.iter().enumerate() {
            let Some(connector) = row.as_connector() else {
                continue;
            };
            for &pipe in &connector.pipe_columns {
                let column = pipe as isize;
                let continues_run = index.checked_sub(1).map_or(false, |above| {
                    let above = &rows[above];
                    above.as_connector().is_some() && above.pipe_near(column, reach).is_some()
                });
                if continues_run {
                    continue;
                }

                let upper = tracer.trace_within(index, column, Direction::Up, steps);
                let lower = tracer.trace_within(index, column, Direction::Down, steps);
                let line = row.line_index();
                let reason = match (upper, lower) {
                    (Some(a), Some(b)) if a != b => {
                        let (ia, ib) = (people[a.index()].indent_level, people[b.index()].indent_level);
                        if ia == ib {
                            "ends share an indent level"
                        } else {
                            let (child, parent) = if ia > ib { (a, b) } else { (b, a) };
                            if edges.link(child, parent, logs) {
                                debug!(row = line, column = pipe, child = %child, parent = %parent, "lane accepted");
                                logs.push(LogEntry::LaneAccepted {
                                    row: line,
                                    column: pipe,
                                    parent,
                                    child,
                                });
                            }
                            continue;
                        }
                    }
                    (Some(_), Some(_)) => "both ends reach the same person",
                    _ => "lane does not reach two people",
                };
                logs.push(LogEntry::LaneRejected {
                    row: line,
                    column: pipe,
                    reason: reason.to_string(),
                });
            }
        }
    }
}
