//! SyncCheck CLI - Main Entry Point
//!
//! Rehearses the file-management journey, checks CI report files and
//! cleans up local test artifacts.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use synccheck_harness::HarnessConfig;

use synccheck_cli::commands::{cleanup, config, report, run};
use synccheck_cli::output::{self, print_error};

/// SyncCheck - end-to-end checks for file-sync deployments
#[derive(Parser)]
#[command(name = "synccheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    overrides: ConfigArgs,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Config file location and per-field overrides
#[derive(Args)]
struct ConfigArgs {
    /// Harness configuration file (YAML)
    #[arg(short, long, env = "SYNCCHECK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the target URL
    #[arg(long, env = "SYNCCHECK_TARGET_URL", global = true)]
    target_url: Option<String>,

    /// Override the admin username
    #[arg(long, env = "SYNCCHECK_ADMIN_USER", global = true)]
    admin_user: Option<String>,

    /// Override the admin password
    #[arg(long, env = "SYNCCHECK_ADMIN_PASSWORD", hide_env_values = true, global = true)]
    admin_password: Option<String>,

    /// Override the fixture and download root
    #[arg(long, env = "SYNCCHECK_BASE_DIR", global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rehearse the file-management journey against the simulated server
    Run(run::RunArgs),

    /// Evaluate a CI report file
    Report(report::ReportArgs),

    /// Remove local test files
    Cleanup(cleanup::CleanupArgs),

    /// Inspect the configuration
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Show version information
    Version,
}

impl ConfigArgs {
    fn load(&self) -> Result<HarnessConfig> {
        let mut config = config::load(self.config.as_deref())?;
        if let Some(url) = &self.target_url {
            config.target_url = url.clone();
        }
        if let Some(user) = &self.admin_user {
            config.admin.username = user.clone();
        }
        if let Some(password) = &self.admin_password {
            config.admin.password = password.clone();
        }
        if let Some(dir) = &self.base_dir {
            config.base_dir = dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let format = cli.format;
    match cli.command {
        Commands::Run(args) => {
            let outcome = match cli.overrides.load() {
                Ok(config) => run::execute(args, config, format).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    print_error(&format!("{:#}", e));
                    std::process::exit(2);
                }
            }
        }
        Commands::Report(args) => {
            if !report::execute(args, format)? {
                std::process::exit(1);
            }
        }
        Commands::Cleanup(args) => {
            let config = cli.overrides.load()?;
            cleanup::execute(args, &config, format)?;
        }
        Commands::Config(cmd) => {
            let config = cli.overrides.load()?;
            config::execute(cmd, &config, format)?;
        }
        Commands::Version => {
            println!("SyncCheck CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
