//! Config Command

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use synccheck_harness::HarnessConfig;

use crate::output::{print_success, OutputFormat};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Check the configuration and locator catalogue
    Validate,
}

/// Load `path` or fall back to defaults.
pub fn load(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

pub fn execute(cmd: ConfigCommands, config: &HarnessConfig, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", render(config, format)?);
            Ok(())
        }
        ConfigCommands::Validate => {
            config.validate().context("invalid configuration")?;
            print_success(&format!("configuration for {} is valid", config.base_url()));
            Ok(())
        }
    }
}

/// The effective configuration with the admin password masked.
pub fn render(config: &HarnessConfig, format: OutputFormat) -> Result<String> {
    let shown = config.redacted();
    Ok(match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&shown)?),
        _ => shown.to_yaml()?,
    })
}
