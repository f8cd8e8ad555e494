//! sitemig CLI - bilingual legacy-site export for CMS migration
//!
//! This is the main entry point for the sitemig command-line interface.
//! Command implementations live in separate modules.

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod utils;

use cli::{Cli, Commands};
use utils::logging::initialize_logging;
use utils::site::load_site;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    execute_command(&cli).await
}

async fn execute_command(cli: &Cli) -> Result<()> {
    let site = load_site(cli)?;

    match &cli.command {
        Commands::Site { export, redirects } => {
            commands::export_site(&site, export, redirects.as_deref()).await?;
        },

        Commands::News { export } => {
            commands::export_news(&site, export).await?;
        },

        Commands::Stage { dir, out } => {
            commands::stage_news(&site, dir, out).await?;
        },
    }

    Ok(())
}
