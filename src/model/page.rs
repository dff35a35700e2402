//! Snapshot of a scraped pedigree page

use crate::error::PedigraphResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One hyperlinked label found inside the chart's text container
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub label: String,
    #[serde(default)]
    pub href: String,
    /// Font color the site rendered the label with
    #[serde(default)]
    pub color: String,
    /// Pixel offset relative to the container, when the scraper provides it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

impl Anchor {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = href.into();
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// The rendered text and links of a pedigree page.
///
/// Produced by the DOM-scraping collaborator. May be truncated or
/// malformed; the parser degrades instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    pub text: String,
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

impl ExtractedPage {
    pub fn new(text: impl Into<String>, anchors: Vec<Anchor>) -> Self {
        Self {
            text: text.into(),
            html: String::new(),
            anchors,
        }
    }

    /// Read a page snapshot saved as JSON
    pub fn from_json_file(path: impl AsRef<Path>) -> PedigraphResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_deserializes_with_missing_optional_fields() {
        let page: ExtractedPage = serde_json::from_str(
            r#"{"text": "Tom", "anchors": [{"label": "Tom", "color": "blue"}]}"#,
        )
        .unwrap();
        assert_eq!(page.html, "");
        assert_eq!(page.anchors[0].href, "");
        assert!(page.anchors[0].x.is_none());
    }

    #[test]
    fn non_string_text_is_rejected() {
        let result: Result<ExtractedPage, _> = serde_json::from_str(r#"{"text": 42}"#);
        assert!(result.is_err());
    }
}
