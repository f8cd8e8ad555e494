//! Link normalization onto the canonical base domain.
//!
//! Legacy pages reference each other with every URL flavour imaginable:
//! root-relative paths, bare host names without a scheme, protocol-relative
//! URLs and, occasionally, document-relative paths. Everything the crawler
//! and the rewriter look at goes through [`absolutize`] (or
//! [`absolutize_in`] when the referring page is known) first.
//!
//! ```rust
//! use sitemig_core::{SiteConfig, link::absolutize};
//!
//! let site = SiteConfig::default();
//! assert_eq!(
//!     absolutize("/home/pagina.html", &site),
//!     "http://www.fondazionezeri.unibo.it/home/pagina.html"
//! );
//! assert_eq!(absolutize("#", &site), "");
//! ```

use crate::SiteConfig;
use url::Url;

/// Schemes that never point at a crawlable page.
const OPAQUE_SCHEMES: &[&str] = &["mailto:", "javascript:", "tel:", "data:", "ftp:"];

/// Convert a raw href/src value into an absolute URL rooted at the base
/// domain.
///
/// Placeholder anchors (see [`SiteConfig::rejected_links`]) and blank values
/// become the empty string. Absolute and off-domain URLs are returned
/// unchanged.
#[must_use]
pub fn absolutize(raw: &str, site: &SiteConfig) -> String {
    let raw = raw.trim();
    if raw.is_empty() || site.rejected_links.iter().any(|r| r == raw) {
        return String::new();
    }
    if raw.starts_with("//") {
        let scheme = site.base_url.split(':').next().unwrap_or("http");
        return format!("{scheme}:{raw}");
    }
    if raw.starts_with('/') {
        return format!("{}{raw}", site.base_url);
    }
    if let Some(rest) = raw.strip_prefix(site.legacy_host.as_str()) {
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            return format!("{}{rest}", site.base_url);
        }
    }
    raw.to_string()
}

/// Like [`absolutize`], additionally resolving document-relative paths
/// (`pagina.html`, `../sezione/`) against the page they appear on.
#[must_use]
pub fn absolutize_in(raw: &str, page_url: &str, site: &SiteConfig) -> String {
    let absolute = absolutize(raw, site);
    if absolute.is_empty() || has_scheme(&absolute) {
        return absolute;
    }
    if absolute.starts_with('#') {
        return String::new();
    }
    Url::parse(page_url)
        .and_then(|base| base.join(&absolute))
        .map_or(absolute, |joined| joined.to_string())
}

fn has_scheme(value: &str) -> bool {
    value.starts_with("http://")
        || value.starts_with("https://")
        || OPAQUE_SCHEMES.iter().any(|s| value.starts_with(s))
}

/// Split a path or URL into the part before `?` and the query string.
#[must_use]
pub fn split_query(value: &str) -> (&str, Option<&str>) {
    match value.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (value, None),
    }
}
