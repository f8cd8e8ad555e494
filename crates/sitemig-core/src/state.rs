//! Mutable state of one crawl run.
//!
//! Everything a run accumulates lives in a [`CrawlState`] owned by the
//! caller and passed by `&mut` into the fetcher, the rewriter and the
//! exporter. Every collection in here only grows; starting over means
//! building a new state.

use crate::{Page, PathRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// URLs already fetched in this run.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    /// Record a URL. Returns `false` if it was already present.
    pub fn insert(&mut self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    /// Whether `url` has been fetched.
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Number of recorded URLs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.urls.len()
    }

    /// Whether no URL has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// One legacy → new path redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    /// Path on the legacy site.
    pub source: String,
    /// Path on the new site.
    pub dest: String,
}

/// Legacy → new path redirects collected while exporting, in export order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectMap {
    entries: Vec<Redirect>,
}

impl RedirectMap {
    /// Add a redirect. A source already mapped keeps its first destination;
    /// a redirect onto itself is ignored.
    pub fn insert(&mut self, source: &str, dest: &str) -> bool {
        if source == dest || self.entries.iter().any(|r| r.source == source) {
            return false;
        }
        self.entries.push(Redirect {
            source: source.to_string(),
            dest: dest.to_string(),
        });
        true
    }

    /// Destination of a legacy path.
    #[must_use]
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|r| r.source == source)
            .map(|r| r.dest.as_str())
    }

    /// Iterate redirects in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Redirect> {
        self.entries.iter()
    }

    /// Number of redirects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no redirect has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// State threaded through every component of a crawl.
#[derive(Debug, Default)]
pub struct CrawlState {
    /// Fetched URLs (requested and final).
    pub visited: VisitedSet,
    /// Allocated output paths.
    pub paths: PathRegistry,
    /// Collected redirects.
    pub redirects: RedirectMap,
    resolved: HashMap<String, Option<String>>,
    pending: HashMap<String, Page>,
    rewritten: HashSet<String>,
    count: u64,
}

impl CrawlState {
    /// Fresh state for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next written record receives.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Move past the current sequence number. Called once a record is on
    /// disk.
    pub fn advance_count(&mut self) {
        self.count += 1;
    }

    /// Cached redirect resolution of `url`.
    ///
    /// `Some(None)` means the URL was tried and could not be resolved.
    #[must_use]
    pub fn cached_resolution(&self, url: &str) -> Option<Option<&str>> {
        self.resolved.get(url).map(Option::as_deref)
    }

    /// Remember how `url` resolved.
    pub fn cache_resolution(&mut self, url: &str, final_url: Option<String>) {
        self.resolved.insert(url.to_string(), final_url);
    }

    /// Keep a response obtained while resolving a link until the crawl
    /// visits its URL.
    pub(crate) fn store_pending(&mut self, page: Page) {
        self.pending.insert(page.url.clone(), page);
    }

    /// Hand out a stored response. Each one is handed out once.
    pub(crate) fn take_pending(&mut self, url: &str) -> Option<Page> {
        self.pending.remove(url)
    }

    /// Remember a link target produced by the content rewriter.
    pub fn mark_rewritten(&mut self, path: &str) {
        self.rewritten.insert(path.to_string());
    }

    /// Whether `path` is a link target the content rewriter produced.
    #[must_use]
    pub fn is_rewritten(&self, path: &str) -> bool {
        self.rewritten.contains(path)
    }
}
