//! Report Command
//!
//! Pass/fail verdicts for CI report files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use synccheck_report::{evaluate_file, ReportKind, Verdict, DEFAULT_THRESHOLD};

use crate::output::{mark, print_item, OutputFormat, TableDisplay};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportFormat {
    /// End-to-end log, fails on a FAIL or "Test Suite Failed" line
    Text,
    /// kube-bench summary block
    Summary,
    /// YAML document with a top-level status
    Status,
    /// HTML compliance report score
    Score,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Report format
    #[arg(value_enum)]
    pub kind: ReportFormat,

    /// Report file
    pub path: PathBuf,

    /// Minimum passing score for `score` reports
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
}

impl ReportArgs {
    fn report_kind(&self) -> ReportKind {
        match self.kind {
            ReportFormat::Text => ReportKind::Text,
            ReportFormat::Summary => ReportKind::Summary,
            ReportFormat::Status => ReportKind::Status,
            ReportFormat::Score => ReportKind::Score {
                threshold: self.threshold,
            },
        }
    }
}

impl TableDisplay for Verdict {
    fn headers() -> Vec<&'static str> {
        vec!["Result", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![mark(self.passed), self.message.clone()]
    }
}

/// Returns whether the report passed.
pub fn execute(args: ReportArgs, format: OutputFormat) -> Result<bool> {
    let verdict = evaluate_file(args.report_kind(), &args.path)
        .with_context(|| format!("evaluating {}", args.path.display()))?;
    print_item(&verdict, format);
    Ok(verdict.passed)
}
