//! SyncCheck report verdicts
//!
//! Turns the output files of conformance and hardening runs into a single
//! pass/fail [`Verdict`]:
//! - `text`: end-to-end log, fails on any failure marker line
//! - `summary`: kube-bench style `== Summary total ==` block
//! - `status`: YAML results document with a top-level `status`
//! - `score`: HTML compliance report, first centered table cell

pub mod error;
pub mod score;
pub mod status;
pub mod summary;
pub mod text;
pub mod verdict;

use std::path::Path;

use tracing::{debug, info, warn};

pub use error::{ReportError, ReportResult};
pub use score::DEFAULT_THRESHOLD;
pub use verdict::Verdict;

/// The report formats understood by [`evaluate_file`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReportKind {
    Text,
    Summary,
    Status,
    Score { threshold: f64 },
}

impl ReportKind {
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Text => "text",
            ReportKind::Summary => "summary",
            ReportKind::Status => "status",
            ReportKind::Score { .. } => "score",
        }
    }
}

/// Read `path` and evaluate it as `kind`.
pub fn evaluate_file(kind: ReportKind, path: &Path) -> ReportResult<Verdict> {
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), bytes = content.len(), kind = kind.name(), "read report");
    let verdict = evaluate_str(kind, &content)?;

    if verdict.passed {
        info!(kind = kind.name(), "✓ {}", verdict.message);
    } else {
        warn!(kind = kind.name(), "✗ {}", verdict.message);
    }
    Ok(verdict)
}

pub fn evaluate_str(kind: ReportKind, content: &str) -> ReportResult<Verdict> {
    match kind {
        ReportKind::Text => Ok(text::evaluate(content)),
        ReportKind::Summary => summary::evaluate(content),
        ReportKind::Status => status::evaluate(content),
        ReportKind::Score { threshold } => score::evaluate(content, threshold),
    }
}
