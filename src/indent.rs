//! Indent quantization
//!
//! Label columns are noisy; the reconstructor compares generations through
//! a small ordinal scale instead. The unit step is the smallest gap between
//! distinct label columns.

use crate::config::ToleranceConfig;
use crate::model::Person;
use serde::{Deserialize, Serialize};

/// Mapping from label columns to indent levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndentScale {
    pub min_column: usize,
    pub step: usize,
}

impl IndentScale {
    /// Derive the scale from a set of label columns
    pub fn from_columns(columns: &[usize], tolerance: &ToleranceConfig) -> Self {
        let mut distinct = columns.to_vec();
        distinct.sort_unstable();
        distinct.dedup();

        let min_column = distinct.first().copied().unwrap_or(0);
        let gap = distinct.windows(2).map(|w| w[1] - w[0]).min();
        let step = match gap {
            Some(gap) if gap >= tolerance.min_step.max(1) => gap,
            _ => tolerance.default_step.max(1),
        };

        Self { min_column, step }
    }

    /// `round((column - min_column) / step)`
    pub fn level(&self, column: usize) -> usize {
        let offset = column.saturating_sub(self.min_column) as f64;
        (offset / self.step as f64).round() as usize
    }

    /// Stamp `indent_level` on every person
    pub fn apply(&self, people: &mut [Person]) {
        for person in people {
            person.indent_level = self.level(person.column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_is_minimum_gap() {
        let scale = IndentScale::from_columns(&[12, 0, 6, 6, 18], &ToleranceConfig::default());
        assert_eq!(scale, IndentScale { min_column: 0, step: 6 });
        assert_eq!(scale.level(13), 2);
        assert_eq!(scale.level(15), 3);
    }

    #[test]
    fn falls_back_when_columns_tie() {
        let scale = IndentScale::from_columns(&[5, 5], &ToleranceConfig::default());
        assert_eq!(scale.step, 4);
        assert_eq!(scale.level(5), 0);
    }

    #[test]
    fn falls_back_below_floor() {
        let scale = IndentScale::from_columns(&[0, 1, 9], &ToleranceConfig::default());
        assert_eq!(scale.step, 4);
        assert_eq!(scale.level(9), 2);
    }

    #[test]
    fn empty_input() {
        let scale = IndentScale::from_columns(&[], &ToleranceConfig::default());
        assert_eq!(scale.level(0), 0);
        assert_eq!(scale.level(8), 2);
    }
}
