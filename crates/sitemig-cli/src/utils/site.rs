//! Resolution of the site configuration from the global flags.

use anyhow::{Context, Result};
use sitemig_core::SiteConfig;

use crate::cli::Cli;

/// Load the configuration file (or the defaults) and apply `--base-url`.
pub fn load_site(cli: &Cli) -> Result<SiteConfig> {
    let site = SiteConfig::load(cli.config.as_deref()).context("Failed to load site configuration")?;
    match cli.base_url.as_deref() {
        Some(base_url) => site
            .with_base_url(base_url)
            .with_context(|| format!("Invalid --base-url '{base_url}'")),
        None => Ok(site),
    }
}
