//! Logging initialization and configuration.
//!
//! Scrape gaps are reported as warnings, so WARN is the default level; the
//! global flags move it to DEBUG (`-v`) or ERROR (`-q`). Logs always go to
//! stderr.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Log level selected by the global flags.
pub const fn level_for(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Initialize the logging subsystem based on CLI flags.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level_for(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let env_no_color = std::env::var("NO_COLOR").ok().is_some();
    if cli.no_color || env_no_color {
        color_control::set_override(false);
    }
    Ok(())
}
