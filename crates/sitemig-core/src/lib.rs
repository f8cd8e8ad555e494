//! # sitemig-core
//!
//! Core functionality for sitemig - an exporter that turns a bilingual
//! legacy website into JSON records for a CMS import pipeline.
//!
//! The crawler walks the site from its menus, gives every page a unique,
//! normalized path built from its breadcrumb, rewrites the links inside
//! page bodies to point at those new paths, and writes one JSON file per
//! page, folder and downloadable asset.
//!
//! ## Architecture
//!
//! - **Configuration**: site constants, structural selectors and HTTP settings
//! - **Links and paths**: URL normalization, path allocation, asset buckets
//! - **Fetching**: visit-once HTTP access to the legacy site
//! - **Extraction and rewriting**: structural parsing and body link rewriting
//! - **Export**: the recursive site crawl, the flat sitemap news export and
//!   the news metadata staging
//! - **Error Handling**: one error type with categorization
//!
//! ## Quick Start
//!
//! ```rust
//! use sitemig_core::{Lang, PathRegistry};
//! use sitemig_core::paths::breadcrumb_path;
//!
//! let levels: Vec<String> = "Home » Attività » Mostre"
//!     .split('»')
//!     .map(String::from)
//!     .collect();
//! let mut registry = PathRegistry::default();
//! let first = registry.allocate(&breadcrumb_path(&levels, Lang::It));
//! let second = registry.allocate(&breadcrumb_path(&levels, Lang::It));
//! assert_eq!(first, "/it/attivita/mostre");
//! assert_eq!(second, "/it/attivita/mostre_00");
//! ```
//!
//! ## Error Handling
//!
//! Scrape gaps (broken links, missing translations, broken images) are
//! logged and skipped; only configuration problems, a missing home page or
//! staging directory, and output failures surface as [`Error`].

/// Upload-folder relocation rules per file kind and language
pub mod buckets;
/// Site configuration
pub mod config;
/// Error types and result aliases
pub mod error;
/// Recursive site export
pub mod exporter;
/// Structural extraction from legacy pages
pub mod extract;
/// Visit-once HTTP fetching
pub mod fetcher;
/// URL normalization
pub mod link;
/// Flat news export from the sitemap
pub mod news;
/// Path normalization and allocation
pub mod paths;
/// Exported record types
pub mod record;
/// Body link rewriting
pub mod rewrite;
/// Sitemap parsing
pub mod sitemap;
/// Legacy news metadata staging
pub mod source;
/// Crawl state
pub mod state;
/// Shared enums
pub mod types;
/// JSON record writer
pub mod writer;

// Re-export commonly used types
pub use buckets::BucketRules;
pub use config::{HttpConfig, Selectors, SiteConfig};
pub use error::{Error, Result};
pub use exporter::{CrawlPhase, ExportOptions, ExportSummary, Exporter, WorkItem};
pub use extract::PageSelectors;
pub use fetcher::{Fetcher, Page};
pub use news::{NewsRecord, collect_news};
pub use paths::PathRegistry;
pub use record::{
    ExportRecord, FilePath, FileRecord, FolderEntry, FolderRecord, LocalizedPage, PageRecord,
};
pub use rewrite::ContentRewriter;
pub use source::{ImportItem, NewsSource};
pub use state::{CrawlState, Redirect, RedirectMap, VisitedSet};
pub use types::*;
pub use writer::{RecordWriter, WriteOutcome};
