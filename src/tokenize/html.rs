//! Anchor recovery from the chart's HTML when no anchor list was scraped

use crate::model::Anchor;
use html_escape::decode_html_entities;
use once_cell::sync::Lazy;
use regex::Regex;

static ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").unwrap());
static HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap());
static FONT_COLOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<font\b[^>]*\bcolor\s*=\s*["']?([^"'\s>]+)"#).unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Extract `<a>` elements in document order.
///
/// The color comes from a `<font color>` wrapped inside the link, which is
/// how the chart marks sex.
pub fn anchors_from_html(html: &str) -> Vec<Anchor> {
    ANCHOR
        .captures_iter(html)
        .map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let inner = caps.get(2).map_or("", |m| m.as_str());

            let href = HREF
                .captures(attrs)
                .and_then(|h| h.get(1).or_else(|| h.get(2)).or_else(|| h.get(3)))
                .map(|m| decode_html_entities(m.as_str()).into_owned())
                .unwrap_or_default();
            let color = FONT_COLOR
                .captures(inner)
                .map(|c| c[1].to_lowercase())
                .unwrap_or_default();
            let label = decode_html_entities(&TAG.replace_all(inner, "")).trim().to_string();

            Anchor::new(label).with_href(href).with_color(color)
        })
        .collect()
}
