//! # CLI Structure and Argument Parsing
//!
//! The CLI follows a standard command-subcommand pattern:
//!
//! - **Global options**: logging (`--verbose`, `--quiet`, `--no-color`) and
//!   site configuration (`--config`, `--base-url`)
//! - **Subcommands**: `site`, `news` and `stage`
//!
//! ## Usage Patterns
//!
//! ```bash
//! # Recursive bilingual export into ./exported
//! sitemig site
//!
//! # Fresh export of the first ten second-level pages, with redirects
//! sitemig site -f -l 10 --redirects redirects.json
//!
//! # Flat news export from the sitemap
//! sitemig --config violareggio.toml news -p news
//!
//! # Stage legacy news metadata for the importer
//! sitemig stage ./news-metadata --out staged.jsonl
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Main CLI structure for the `sitemig` command
#[derive(Parser, Clone, Debug)]
#[command(name = "sitemig")]
#[command(version)]
#[command(about = "sitemig - Export a bilingual legacy site as CMS import records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug logs
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress warnings (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Site configuration file (TOML)
    #[arg(long, global = true, env = "SITEMIG_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the base URL of the legacy site
    #[arg(long, global = true, env = "SITEMIG_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,
}

/// Output and pagination options shared by the export commands
#[derive(Args, Clone, Debug)]
pub struct ExportArgs {
    /// Export directory
    #[arg(short = 'p', long, default_value = "exported")]
    pub path: PathBuf,

    /// Maximum number of pages to export (0 = no limit)
    #[arg(short = 'l', long, default_value_t = 0)]
    pub limit: usize,

    /// Number of pages to skip
    #[arg(short = 'o', long, default_value_t = 0)]
    pub offset: usize,

    /// Delete and recreate the export directory first
    #[arg(short = 'f', long)]
    pub force: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Crawl the site from its menus and export every page, folder and file
    Site {
        #[command(flatten)]
        export: ExportArgs,

        /// Also write the collected legacy → new path redirects to this file
        #[arg(long, value_name = "FILE")]
        redirects: Option<PathBuf>,
    },

    /// Export the news articles listed in the sitemap as one JSON array
    News {
        #[command(flatten)]
        export: ExportArgs,
    },

    /// Stage a directory of legacy news metadata as JSON Lines
    Stage {
        /// Directory of metadata files
        dir: PathBuf,

        /// Output file
        #[arg(long, default_value = "staged.jsonl")]
        out: PathBuf,
    },
}
