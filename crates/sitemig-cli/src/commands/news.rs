//! `sitemig news`: flat news export from the sitemap.

use anyhow::{Context, Result};
use colored::Colorize;
use sitemig_core::writer::prepare_output_dir;
use sitemig_core::{
    CrawlState, ExportOptions, Fetcher, PageSelectors, RecordWriter, SiteConfig, collect_news,
};

use crate::cli::ExportArgs;

/// File the gathered articles are written to, inside the export directory.
pub const NEWS_FILE: &str = "news.json";

/// Execute the news export.
pub async fn execute(site: &SiteConfig, args: &ExportArgs) -> Result<()> {
    prepare_output_dir(&args.path, args.force)
        .with_context(|| format!("Cannot prepare export directory {}", args.path.display()))?;

    let fetcher = Fetcher::new(site)?;
    let selectors = PageSelectors::compile(site)?;
    let options = ExportOptions {
        offset: args.offset,
        limit: args.limit,
    };
    let mut state = CrawlState::new();
    let news = collect_news(&fetcher, site, &selectors, &mut state, options)
        .await
        .context("News export failed")?;

    let writer = RecordWriter::new(&args.path, site);
    let path = writer.write_json(NEWS_FILE, &news)?;
    println!(
        "{} {} news articles to {}",
        "Exported".green().bold(),
        news.len(),
        path.display()
    );
    Ok(())
}
