//! Site configuration for the legacy-site exporter.
//!
//! Every site-specific constant the crawler depends on lives here: the
//! canonical base URL, the structural markers used to locate breadcrumbs,
//! titles and bodies, the language switch, and the filters for the flat news
//! export. Defaults reproduce the legacy institutional site; a TOML file may
//! override any subset of fields.
//!
//! ## Example Configuration File
//!
//! ```toml
//! base_url = "http://www.violareggiocalabria.it"
//! legacy_host = "www.violareggiocalabria.it"
//! excluded_prefixes = []
//!
//! [selectors]
//! body = "div.testo"
//! language_switch = "a#ling2"
//!
//! [http]
//! timeout_secs = 60
//! ```
//!
//! ```rust
//! use sitemig_core::SiteConfig;
//!
//! let config = SiteConfig::from_toml_str(r#"base_url = "http://example.org""#)?;
//! assert_eq!(config.base_url, "http://example.org");
//! assert_eq!(config.selectors.breadcrumb, "div.bread");
//! # Ok::<(), sitemig_core::Error>(())
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Global configuration of one migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical scheme + host every exported URL must start with.
    ///
    /// Stored without a trailing slash.
    pub base_url: String,

    /// Bare host name the legacy pages sometimes use without a scheme
    /// (`www.example.it/page.html`). Rewritten onto `base_url`.
    pub legacy_host: String,

    /// Path of the English home page, used to read the English menu.
    pub en_home_path: String,

    /// Path of the sitemap feed used by the flat news export.
    pub sitemap_path: String,

    /// Raw href values that are placeholders rather than links.
    pub rejected_links: Vec<String>,

    /// Label of the character encoding the legacy pages are served in.
    pub encoding: String,

    /// Text shown by the legacy site in place of a missing translation.
    pub missing_translation_marker: String,

    /// Output file names starting with one of these prefixes are not written.
    pub excluded_prefixes: Vec<String>,

    /// Path segments dropped from asset paths (site-name folders).
    pub dropped_segments: Vec<String>,

    /// Substrings a sitemap URL must all contain to be exported as news.
    pub news_markers: Vec<String>,

    /// Structural markers on the legacy pages.
    pub selectors: Selectors,

    /// HTTP client settings.
    pub http: HttpConfig,
}

/// CSS selectors locating the structural parts of a legacy page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// First-level menu section container.
    pub menu_section: String,
    /// Container of a section's child links, inside `menu_section`.
    pub menu_children: String,
    /// Breadcrumb trail.
    pub breadcrumb: String,
    /// Separator between breadcrumb levels.
    pub breadcrumb_separator: String,
    /// Page title.
    pub title: String,
    /// Elements concatenated, in order, into the description.
    pub description: Vec<String>,
    /// Body container whose HTML becomes the record content.
    pub body: String,
    /// Presence of this element marks an automatic summary page.
    pub listing: String,
    /// Link to the English version of an Italian page.
    pub language_switch: String,
    /// Container whose links are crawled as subpages.
    pub subpage_container: String,
    /// News article container (flat news export).
    pub news_article: String,
    /// News title inside the article.
    pub news_title: String,
    /// News header image.
    pub news_image: String,
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.fondazionezeri.unibo.it".to_string(),
            legacy_host: "www.fondazionezeri.unibo.it".to_string(),
            en_home_path: "/home_eng/00000208_Home_Eng.html".to_string(),
            sitemap_path: "/sitemap.xml".to_string(),
            rejected_links: vec!["#".to_string()],
            encoding: "windows-1252".to_string(),
            missing_translation_marker: "Avviso: la pagina non \u{e8} disponibile".to_string(),
            excluded_prefixes: vec!["amici-di-federico-zeri".to_string()],
            dropped_segments: vec!["fondazionezeri".to_string()],
            news_markers: vec!["catid=7:news".to_string(), "Itemid=".to_string()],
            selectors: Selectors::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            menu_section: "div.divprinc".to_string(),
            menu_children: "div.divsec".to_string(),
            breadcrumb: "div.bread".to_string(),
            breadcrumb_separator: "\u{bb}".to_string(),
            title: "div.titolo".to_string(),
            description: vec!["div.preocchiello".to_string(), "div.sottotitolo".to_string()],
            body: "div.testo".to_string(),
            listing: "div.elenco".to_string(),
            language_switch: "a#ling2".to_string(),
            subpage_container: "table.centro".to_string(),
            news_article: "div.item-page".to_string(),
            news_title: "h2.art-postheader".to_string(),
            news_image: "img.art-postheader".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("sitemig/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SiteConfig {
    /// Load configuration from a TOML file, or return the defaults when no
    /// path is given.
    ///
    /// The loaded configuration is validated before being returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        config.validate()?;
        Ok(config)
    }

    /// Replace the base URL (and the legacy host derived from it).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = base_url.trim_end_matches('/').to_string();
        if let Some(host) = Url::parse(&self.base_url).ok().and_then(|u| {
            u.host_str().map(|h| match u.port() {
                Some(port) => format!("{h}:{port}"),
                None => h.to_string(),
            })
        }) {
            self.legacy_host = host;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that the base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.legacy_host.is_empty() {
            return Err(Error::Config("legacy_host must not be empty".into()));
        }
        Ok(())
    }

    /// Absolute URL of the English home page.
    #[must_use]
    pub fn en_home_url(&self) -> String {
        format!("{}{}", self.base_url, self.en_home_path)
    }

    /// Absolute URL of the sitemap feed.
    #[must_use]
    pub fn sitemap_url(&self) -> String {
        format!("{}{}", self.base_url, self.sitemap_path)
    }

    /// Whether `url` lies inside the canonical domain.
    #[must_use]
    pub fn is_internal(&self, url: &str) -> bool {
        is_under(url, &self.base_url)
    }

    /// Domain-relative form of an internal URL; other URLs are returned as is.
    #[must_use]
    pub fn strip_base<'a>(&self, url: &'a str) -> &'a str {
        if is_under(url, &self.base_url) {
            &url[self.base_url.len()..]
        } else {
            url
        }
    }
}

/// Prefix match on a base URL that does not accept a longer host or port
/// (`http://a.it` is not a prefix of `http://a.it.example.org`).
pub(crate) fn is_under(url: &str, base: &str) -> bool {
    url.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = SiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.selectors.breadcrumb_separator, "»");
        assert_eq!(
            config.en_home_url(),
            "http://www.fondazionezeri.unibo.it/home_eng/00000208_Home_Eng.html"
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SiteConfig::from_toml_str(
            r#"
            base_url = "http://www.violareggiocalabria.it/"
            excluded_prefixes = []

            [selectors]
            body = "div.contenuto"
            "#,
        )
        .unwrap();
        assert_eq!(config.base_url, "http://www.violareggiocalabria.it");
        assert!(config.excluded_prefixes.is_empty());
        assert_eq!(config.selectors.body, "div.contenuto");
        assert_eq!(config.selectors.title, "div.titolo");
        assert_eq!(config.http.timeout_secs, 30);
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let err = SiteConfig::from_toml_str(r#"base_url = "/relative""#).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = SiteConfig::from_toml_str(r#"base_url = "ftp://example.org""#).unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_with_base_url_updates_legacy_host() {
        let config = SiteConfig::default()
            .with_base_url("http://127.0.0.1:8080/")
            .unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.legacy_host, "127.0.0.1:8080");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sitemap_path = \"/map.xml\"").unwrap();
        let config = SiteConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.sitemap_url(), "http://www.fondazionezeri.unibo.it/map.xml");
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = SiteConfig::load(Some(Path::new("/nonexistent/sitemig.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_strip_base() {
        let config = SiteConfig::default();
        assert_eq!(
            config.strip_base("http://www.fondazionezeri.unibo.it/a/b.html"),
            "/a/b.html"
        );
        assert_eq!(config.strip_base("http://other.org/x"), "http://other.org/x");
    }

    #[test]
    fn test_is_internal_rejects_longer_host() {
        let config = SiteConfig::default()
            .with_base_url("http://127.0.0.1:1234")
            .unwrap();
        assert!(config.is_internal("http://127.0.0.1:1234/a"));
        assert!(config.is_internal("http://127.0.0.1:1234"));
        assert!(!config.is_internal("http://127.0.0.1:12345/a"));
        assert_eq!(config.strip_base("http://127.0.0.1:12345/a"), "http://127.0.0.1:12345/a");
    }
}
