//! Flat news export driven by the sitemap.
//!
//! Unlike the recursive site export, this mode gathers every article first
//! and writes them once, as a single JSON array.

use crate::exporter::ExportOptions;
use crate::extract::{PageSelectors, extract_news};
use crate::sitemap::{SitemapEntry, fetch_sitemap};
use crate::{CrawlState, Fetcher, Result, SiteConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// One news article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Article title.
    pub title: String,
    /// Absolute URL of the header image, empty when there is none.
    pub img_src: String,
    /// Alternative text of the header image.
    pub img_alt: String,
    /// Non-empty paragraphs of the article, in order.
    pub text: Vec<String>,
    /// Final URL of the article.
    pub url: String,
}

/// Sitemap URLs that contain every marker.
pub fn filter_news_urls<'a>(
    entries: &'a [SitemapEntry],
    markers: &'a [String],
) -> impl Iterator<Item = &'a str> + 'a {
    entries
        .iter()
        .map(|entry| entry.url.as_str())
        .filter(move |url| markers.iter().all(|marker| url.contains(marker.as_str())))
}

/// Collect the news articles listed by the site's sitemap.
///
/// Articles that cannot be fetched or have no article container are
/// skipped.
#[instrument(skip_all)]
pub async fn collect_news(
    fetcher: &Fetcher,
    site: &SiteConfig,
    selectors: &PageSelectors,
    state: &mut CrawlState,
    options: ExportOptions,
) -> Result<Vec<NewsRecord>> {
    let entries = fetch_sitemap(fetcher, &site.sitemap_url(), state).await?;
    let urls: Vec<&str> = options
        .window(filter_news_urls(&entries, &site.news_markers))
        .collect();
    info!("Found {} news articles in the sitemap", urls.len());

    let mut news = Vec::with_capacity(urls.len());
    for url in urls {
        let Some(page) = fetcher.fetch(url, state).await else {
            continue;
        };
        match extract_news(&page.text(), &page.url, selectors, site) {
            Some(record) => news.push(record),
            None => warn!("No article found in '{}'", page.url),
        }
    }
    Ok(news)
}
