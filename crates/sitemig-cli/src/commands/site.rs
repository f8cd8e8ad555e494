//! `sitemig site`: recursive bilingual export.

use anyhow::{Context, Result};
use colored::Colorize;
use sitemig_core::writer::prepare_output_dir;
use sitemig_core::{CrawlState, ExportOptions, Exporter, Fetcher, RecordWriter, SiteConfig};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::cli::ExportArgs;

/// Execute the site export.
pub async fn execute(site: &SiteConfig, args: &ExportArgs, redirects: Option<&Path>) -> Result<()> {
    prepare_output_dir(&args.path, args.force)
        .with_context(|| format!("Cannot prepare export directory {}", args.path.display()))?;

    let fetcher = Fetcher::new(site)?;
    let options = ExportOptions {
        offset: args.offset,
        limit: args.limit,
    };
    let mut exporter = Exporter::new(&fetcher, site, options)?;
    let mut writer = RecordWriter::new(&args.path, site);
    let mut state = CrawlState::new();

    let summary = exporter
        .run(&mut state, &mut writer)
        .await
        .context("Site export failed")?;

    if let Some(file) = redirects {
        let json = serde_json::to_string_pretty(&state.redirects)?;
        fs::write(file, json)
            .with_context(|| format!("Cannot write redirects to {}", file.display()))?;
        info!("Wrote {} redirects to {}", state.redirects.len(), file.display());
    }

    println!(
        "{} {} records to {} ({} skipped, {} URLs visited)",
        "Exported".green().bold(),
        summary.written,
        args.path.display(),
        summary.skipped,
        summary.visited
    );
    Ok(())
}
