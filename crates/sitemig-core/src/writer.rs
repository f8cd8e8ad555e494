//! One JSON file per exported record.

use crate::{CrawlState, ExportRecord, Result, SiteConfig};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A record with the sequence number it was written under.
#[derive(Serialize)]
struct Numbered<'a> {
    #[serde(flatten)]
    record: &'a ExportRecord,
    count: u64,
}

/// What happened to a record handed to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Written under sequence number `count`.
    Written {
        /// Sequence number.
        count: u64,
        /// File written.
        path: PathBuf,
    },
    /// Matched an excluded prefix; nothing written, no number consumed.
    Excluded,
}

/// Writes records into the export directory.
#[derive(Debug)]
pub struct RecordWriter {
    dir: PathBuf,
    excluded_prefixes: Vec<String>,
    written: usize,
    skipped: usize,
}

/// File name of a record from its Italian path.
///
/// ```rust
/// use sitemig_core::writer::record_file_name;
///
/// assert_eq!(record_file_name("/it/chi-siamo/storia"), "it-chi-siamo-storia.json");
/// assert_eq!(record_file_name("/allegati/a%20b.pdf"), "allegati-a-b.pdf.json");
/// ```
#[must_use]
pub fn record_file_name(it_path: &str) -> String {
    let flat = it_path
        .trim_start_matches('/')
        .replace('/', "-")
        .replace("%20", "-");
    format!("{flat}.json")
}

/// Create the export directory, wiping it first when `force` is set.
pub fn prepare_output_dir(path: &Path, force: bool) -> Result<()> {
    if force && path.exists() {
        info!("Removing existing export directory {}", path.display());
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

impl RecordWriter {
    /// Writer into `dir`, which must exist.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, site: &SiteConfig) -> Self {
        Self {
            dir: dir.into(),
            excluded_prefixes: site.excluded_prefixes.clone(),
            written: 0,
            skipped: 0,
        }
    }

    /// Export directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serialize a record under the next sequence number.
    ///
    /// The counter in `state` only advances once the file is on disk.
    pub fn write(&mut self, record: &ExportRecord, state: &mut CrawlState) -> Result<WriteOutcome> {
        let name = record_file_name(record.it_path());
        if self.excluded_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            debug!("Skipping excluded record {}", name);
            self.skipped += 1;
            return Ok(WriteOutcome::Excluded);
        }

        let count = state.count();
        let path = self.write_json(&name, &Numbered { record, count })?;
        state.advance_count();
        self.written += 1;
        debug!("Wrote {} record #{} to {}", record.kind(), count, path.display());
        Ok(WriteOutcome::Written { count, path })
    }

    /// Write any serializable value as pretty JSON into the export
    /// directory.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Records written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Records skipped because of an excluded prefix.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }
}
