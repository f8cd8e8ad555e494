//! `sitemig stage`: legacy news metadata staging.

use anyhow::{Context, Result};
use colored::Colorize;
use sitemig_core::{Fetcher, NewsSource, SiteConfig};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Stage every metadata file of `dir` into `out`, one JSON item per line.
pub async fn execute(site: &SiteConfig, dir: &Path, out: &Path) -> Result<()> {
    let source = NewsSource::open(dir)?;
    let fetcher = Fetcher::new(site)?;
    let items = source.stage(&fetcher).await?;

    let file = File::create(out).with_context(|| format!("Cannot create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    for item in &items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    println!(
        "{} {} items to {}",
        "Staged".green().bold(),
        items.len(),
        out.display()
    );
    Ok(())
}
