//! Sitemap parsing for the flat news export.
//!
//! Supports both standard sitemaps (`<urlset>` of `<url>` entries) and
//! sitemap indices (`<sitemapindex>` of `<sitemap>` entries pointing at
//! further sitemaps). Indices are followed up to [`MAX_INDEX_DEPTH`] levels.
//!
//! ```rust
//! use sitemig_core::sitemap::{SitemapContent, parse_sitemap_content};
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url><loc>http://example.org/index.php?option=com_content&amp;id=3</loc></url>
//! </urlset>"#;
//!
//! match parse_sitemap_content(xml)? {
//!     SitemapContent::Entries(entries) => {
//!         assert_eq!(entries[0].url, "http://example.org/index.php?option=com_content&id=3");
//!     },
//!     SitemapContent::Index(_) => unreachable!(),
//! }
//! # Ok::<(), sitemig_core::Error>(())
//! ```

use crate::{CrawlState, Error, Fetcher, Result};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{debug, instrument, warn};

/// Maximum nesting of sitemap index files.
pub const MAX_INDEX_DEPTH: u8 = 2;

/// One URL listed by a sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Listed URL.
    pub url: String,
    /// Last modification date, when given and parsable.
    pub lastmod: Option<DateTime<Utc>>,
}

/// Parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapContent {
    /// Standard sitemap.
    Entries(Vec<SitemapEntry>),
    /// Sitemap index: URLs of child sitemaps.
    Index(Vec<String>),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Container {
    Url,
    Sitemap,
}

/// Check if the XML content is a sitemap index.
#[must_use]
pub fn is_sitemap_index(xml: &str) -> bool {
    xml.contains("<sitemapindex") || xml.contains("sitemapindex>")
}

/// Parse a sitemap or sitemap index.
pub fn parse_sitemap_content(xml: &str) -> Result<SitemapContent> {
    let index = is_sitemap_index(xml);
    let wanted = if index { Container::Sitemap } else { Container::Url };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut inside = false;
    let mut field: Option<String> = None;
    let mut loc: Option<String> = None;
    let mut lastmod: Option<DateTime<Utc>> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match (name.as_str(), wanted) {
                    ("url", Container::Url) | ("sitemap", Container::Sitemap) => {
                        inside = true;
                        loc = None;
                        lastmod = None;
                    },
                    ("loc" | "lastmod", _) if inside => field = Some(name),
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let closes = matches!(
                    (name.as_str(), wanted),
                    ("url", Container::Url) | ("sitemap", Container::Sitemap)
                );
                if closes && inside {
                    if let Some(url) = loc.take() {
                        entries.push(SitemapEntry {
                            url,
                            lastmod: lastmod.take(),
                        });
                    }
                    inside = false;
                }
                field = None;
            },
            Ok(Event::Text(e)) => {
                if let Some(ref current) = field {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    let text = text.trim();
                    match current.as_str() {
                        "loc" => loc = Some(text.to_string()),
                        "lastmod" => lastmod = parse_lastmod(text),
                        _ => {},
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Parse(format!("XML parse error: {e}"))),
            _ => {},
        }
        buf.clear();
    }

    Ok(if index {
        SitemapContent::Index(entries.into_iter().map(|e| e.url).collect())
    } else {
        SitemapContent::Entries(entries)
    })
}

/// Parse a lastmod date: RFC 3339, bare date, or date-time without zone.
fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    debug!(date_str = %s, "Could not parse lastmod date");
    None
}

/// Fetch a sitemap and every sitemap it indexes, in document order.
///
/// The root sitemap must be reachable; unreachable or malformed child
/// sitemaps are skipped with a warning.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_sitemap(
    fetcher: &Fetcher,
    url: &str,
    state: &mut CrawlState,
) -> Result<Vec<SitemapEntry>> {
    let mut entries = Vec::new();
    let mut pending = vec![(url.to_string(), 0u8)];

    while let Some((current, depth)) = pending.pop() {
        let is_root = depth == 0;
        let Some(page) = fetcher.fetch(&current, state).await else {
            if is_root {
                return Err(Error::NotFound(format!("Sitemap '{current}' could not be fetched")));
            }
            continue;
        };
        let content = match parse_sitemap_content(&page.text()) {
            Ok(content) => content,
            Err(err) if !is_root => {
                warn!("Skipping malformed sitemap '{}': {}", current, err);
                continue;
            },
            Err(err) => return Err(err),
        };
        match content {
            SitemapContent::Entries(found) => {
                debug!(count = found.len(), "Sitemap entries from {}", current);
                entries.extend(found);
            },
            SitemapContent::Index(children) if depth < MAX_INDEX_DEPTH => {
                pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            },
            SitemapContent::Index(_) => {
                warn!("Sitemap index nesting too deep at '{}'", current);
            },
        }
    }

    Ok(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use crate::SiteConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn urlset(urls: &[&str]) -> String {
        let body: String = urls
            .iter()
            .map(|u| format!("<url><loc>{u}</loc><lastmod>2013-05-02</lastmod></url>"))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{body}</urlset>"#
        )
    }

    #[test]
    fn test_parses_urlset_with_lastmod() {
        let content = parse_sitemap_content(&urlset(&["http://x/a", "http://x/b"])).unwrap();
        let SitemapContent::Entries(entries) = content else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].url, "http://x/b");
        assert_eq!(
            entries[0].lastmod.unwrap().date_naive(),
            NaiveDate::from_ymd_opt(2013, 5, 2).unwrap()
        );
    }

    #[test]
    fn test_parses_index() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap><loc>http://x/s1.xml</loc></sitemap>
            <sitemap><loc>http://x/s2.xml</loc><lastmod>2013-01-01</lastmod></sitemap>
        </sitemapindex>"#;
        assert_eq!(
            parse_sitemap_content(xml).unwrap(),
            SitemapContent::Index(vec!["http://x/s1.xml".into(), "http://x/s2.xml".into()])
        );
    }

    #[test]
    fn test_url_without_loc_is_ignored() {
        let xml = r#"<urlset><url><lastmod>2013-01-01</lastmod></url><url><loc>http://x/a</loc></url></urlset>"#;
        let SitemapContent::Entries(entries) = parse_sitemap_content(xml).unwrap() else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 1);
        assert!(entries[0].lastmod.is_none());
    }

    #[test]
    fn test_malformed_xml_is_parse_error() {
        let err = parse_sitemap_content("<urlset><url><loc>x</url></urlset>").unwrap_err();
        assert_eq!(err.category(), "parse");
    }

    #[tokio::test]
    async fn test_fetch_follows_index_in_order() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let uri = server.uri();
        let index = format!(
            "<sitemapindex><sitemap><loc>{uri}/s1.xml</loc></sitemap><sitemap><loc>{uri}/s2.xml</loc></sitemap><sitemap><loc>{uri}/gone.xml</loc></sitemap></sitemapindex>"
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/s1.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["http://x/1"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/s2.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(urlset(&["http://x/2", "http://x/3"])))
            .mount(&server)
            .await;

        let site = SiteConfig::default().with_base_url(&uri)?;
        let fetcher = Fetcher::new(&site)?;
        let mut state = CrawlState::new();
        let entries = fetch_sitemap(&fetcher, &site.sitemap_url(), &mut state).await?;
        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, ["http://x/1", "http://x/2", "http://x/3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_root_sitemap_is_not_found() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        let site = SiteConfig::default().with_base_url(&server.uri())?;
        let fetcher = Fetcher::new(&site)?;
        let mut state = CrawlState::new();
        let err = fetch_sitemap(&fetcher, &site.sitemap_url(), &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        Ok(())
    }
}
