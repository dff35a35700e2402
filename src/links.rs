//! Resolution of anchor hrefs to absolute profile URLs

use serde::{Deserialize, Serialize};
use url::Url;

/// Turns the hrefs found on chart anchors into absolute URLs.
///
/// Relative hrefs are joined onto `base`. Absolute http(s) URLs on one of
/// the `host_aliases` domains, or any subdomain of one, are moved onto the
/// base host, so every link in an export points at the same site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkResolver {
    pub base: String,
    pub host_aliases: Vec<String>,
}

impl Default for LinkResolver {
    fn default() -> Self {
        Self {
            base: "https://pro.gedmatch.com/".to_string(),
            host_aliases: vec!["gedmatch.com".to_string()],
        }
    }
}

impl LinkResolver {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            host_aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, host: impl Into<String>) -> Self {
        self.host_aliases.push(host.into());
        self
    }

    /// Absolute URL for `href`, or `None` when there is nothing to link to
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.eq_ignore_ascii_case("null") {
            return None;
        }

        let base = Url::parse(&self.base).ok()?;
        let mut url = match Url::parse(href) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => base.join(href).ok()?,
            Err(_) => return None,
        };

        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }

        let aliased = match (url.host_str(), base.host_str()) {
            (Some(host), Some(base_host)) if !host.eq_ignore_ascii_case(base_host) => {
                self.host_aliases.iter().any(|alias| on_domain(host, alias))
            }
            _ => false,
        };
        if aliased {
            url.set_host(base.host_str()).ok()?;
            url.set_scheme(base.scheme()).ok()?;
        }

        Some(url.to_string())
    }
}

/// `host` is `domain` itself or one of its subdomains
fn on_domain(host: &str, domain: &str) -> bool {
    let (host, domain) = (host.to_ascii_lowercase(), domain.trim().to_ascii_lowercase());
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
}
