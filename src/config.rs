//! Parser and export configuration
//!
//! Every heuristic constant the reconstructor relies on lives in
//! [`ToleranceConfig`]. The whole tree deserializes from one YAML file where
//! any missing section or field falls back to its default.

use crate::error::PedigraphResult;
use crate::links::LinkResolver;
use crate::model::Sex;
use crate::workflow::BackoffConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Current configuration format version
pub const CONFIG_VERSION: u32 = 1;

/// Column and search limits used while tracing connectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Max distance between a lane column and a `|`, `/` or `\` glyph
    pub column_tolerance: usize,
    /// Max distance between a lane column and a person's label column
    pub person_tolerance: usize,
    /// Meaningful rows a single trace may walk
    pub max_trace_rows: usize,
    /// Meaningful rows a pipe lane may walk in each direction
    pub max_pipe_bridge_steps: usize,
    /// Fraction of the indent step used to offset parent and child columns
    pub segment_offset_fraction: f64,
    /// Indent step used when the columns give no usable gap
    pub default_step: usize,
    /// Gaps smaller than this are treated as noise
    pub min_step: usize,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            column_tolerance: 3,
            person_tolerance: 4,
            max_trace_rows: 40,
            max_pipe_bridge_steps: 40,
            segment_offset_fraction: 0.5,
            default_step: 4,
            min_step: 2,
        }
    }
}

impl ToleranceConfig {
    /// Diagonal offset for an indent step, never less than one column
    pub fn offset(&self, step: usize) -> usize {
        let raw = (step as f64 * self.segment_offset_fraction).floor();
        if raw.is_finite() && raw >= 1.0 {
            raw as usize
        } else {
            1
        }
    }
}

/// Render color to sex table.
///
/// Keys are compared trimmed and lowercase. Colors not in the table map to
/// [`Sex::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SexLookup(BTreeMap<String, Sex>);

impl Default for SexLookup {
    fn default() -> Self {
        Self::empty().with("red", Sex::Female).with("blue", Sex::Male)
    }
}

impl SexLookup {
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, color: &str, sex: Sex) -> Self {
        self.0.insert(normalize_color(color), sex);
        self
    }

    pub fn sex_for(&self, color: &str) -> Sex {
        let key = normalize_color(color);
        // entries loaded from YAML bypass `with`, so compare normalized keys
        self.0
            .get(&key)
            .copied()
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(k, _)| normalize_color(k) == key)
                    .map(|(_, sex)| *sex)
            })
            .unwrap_or(Sex::Unknown)
    }
}

fn normalize_color(color: &str) -> String {
    color.trim().to_lowercase()
}

/// Everything the core parser needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub version: u32,
    pub tolerance: ToleranceConfig,
    pub sex_colors: SexLookup,
    pub links: LinkResolver,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tolerance: ToleranceConfig::default(),
            sex_colors: SexLookup::default(),
            links: LinkResolver::default(),
        }
    }
}

impl ParseConfig {
    pub fn with_tolerance(mut self, tolerance: ToleranceConfig) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_sex_colors(mut self, sex_colors: SexLookup) -> Self {
        self.sex_colors = sex_colors;
        self
    }
}

/// Labels written into the GEDCOM header and root record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Written as `_OM_KIT_SITE` on the root person
    pub site_label: String,
    /// Written as `1 SOUR` in the header
    pub source_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            site_label: "GEDmatch".to_string(),
            source_name: "pedigraph".to_string(),
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub parse: ParseConfig,
    pub export: ExportConfig,
    pub backoff: BackoffConfig,
}

impl AppConfig {
    /// Load from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> PedigraphResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> PedigraphResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_is_half_step_at_least_one() {
        let tolerance = ToleranceConfig::default();
        assert_eq!(tolerance.offset(4), 2);
        assert_eq!(tolerance.offset(7), 3);
        assert_eq!(tolerance.offset(1), 1);
        assert_eq!(tolerance.offset(0), 1);
    }

    #[test]
    fn sex_lookup_is_case_insensitive() {
        let colors = SexLookup::default();
        assert_eq!(colors.sex_for("RED"), Sex::Female);
        assert_eq!(colors.sex_for(" blue "), Sex::Male);
        assert_eq!(colors.sex_for("green"), Sex::Unknown);
        assert_eq!(colors.sex_for(""), Sex::Unknown);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml_str(
            "parse:\n  tolerance:\n    column_tolerance: 5\n  sex_colors:\n    Purple: F\nexport:\n  site_label: Mirror\n",
        )
        .unwrap();
        assert_eq!(config.parse.tolerance.column_tolerance, 5);
        assert_eq!(config.parse.tolerance.person_tolerance, 4);
        assert_eq!(config.parse.sex_colors.sex_for("purple"), Sex::Female);
        assert_eq!(config.parse.sex_colors.sex_for("red"), Sex::Unknown);
        assert_eq!(config.export.site_label, "Mirror");
        assert_eq!(config.export.source_name, "pedigraph");
        assert_eq!(config.parse.version, CONFIG_VERSION);
    }

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml_str("").unwrap(), AppConfig::default());
    }
}
