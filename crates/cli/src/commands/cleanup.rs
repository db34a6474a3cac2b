//! Cleanup Command
//!
//! Removes local test artifacts left behind by interrupted runs.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use synccheck_harness::entity::{cleanup_prefixed, TEST_PREFIX};
use synccheck_harness::HarnessConfig;

use crate::output::{print_info, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct CleanupArgs {
    /// Only files whose name starts with this prefix are removed
    #[arg(long, default_value = TEST_PREFIX)]
    pub prefix: String,

    /// Directories to clean [default: created-files and download dirs]
    #[arg(long = "dir")]
    pub dirs: Vec<PathBuf>,
}

#[derive(Serialize)]
pub struct RemovedFile {
    pub directory: String,
    pub name: String,
}

impl TableDisplay for RemovedFile {
    fn headers() -> Vec<&'static str> {
        vec!["Directory", "File"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.directory.clone(), self.name.clone()]
    }
}

pub fn execute(
    args: CleanupArgs,
    config: &HarnessConfig,
    format: OutputFormat,
) -> Result<Vec<RemovedFile>> {
    let dirs = if args.dirs.is_empty() {
        vec![config.download_dir(), config.created_files_dir()]
    } else {
        args.dirs
    };

    let mut removed = Vec::new();
    for dir in &dirs {
        let names = cleanup_prefixed(dir, &args.prefix)
            .with_context(|| format!("cleaning {}", dir.display()))?;
        removed.extend(names.into_iter().map(|name| RemovedFile {
            directory: dir.display().to_string(),
            name,
        }));
    }

    if removed.is_empty() {
        print_info("No files were deleted.");
    } else {
        print_list(&removed, format);
    }
    Ok(removed)
}
