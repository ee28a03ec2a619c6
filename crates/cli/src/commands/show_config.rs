//! Show-config CLI command.
//!
//! Prints the configuration the analyze command would run with, after file,
//! profile and environment layering.

use anyhow::{Context, Result};
use clap::Args;
use divergence_core::config_loader::DEFAULT_CONFIG_PATH;
use divergence_core::ConfigLoader;
use std::path::PathBuf;

/// Arguments for the show-config command.
#[derive(Args, Debug, Clone)]
pub struct ShowConfigArgs {
    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Config profile overlay (e.g., "dev" also loads Config.dev.toml)
    #[arg(long)]
    pub profile: Option<String>,
}

/// Runs the show-config command.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or is invalid.
pub fn run_show_config(args: &ShowConfigArgs) -> Result<()> {
    let config = ConfigLoader::load_from(&args.config, args.profile.as_deref())?;
    let rendered =
        serde_json::to_string_pretty(&config).context("Failed to serialize configuration")?;
    println!("{rendered}");
    Ok(())
}
