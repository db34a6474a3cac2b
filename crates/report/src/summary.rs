//! kube-bench style summaries
//!
//! ```text
//! == Summary total ==
//! 72 checks PASS
//! 0 checks FAIL
//! 41 checks WARN
//! 0 checks INFO
//! ```

use regex::Regex;
use tracing::debug;

use crate::error::{ReportError, ReportResult};
use crate::verdict::Verdict;

pub const SUMMARY_HEADER: &str = "== Summary total ==";

/// Lines after the header that belong to the block
const BLOCK_LINES: usize = 4;

const REPORT: &str = "kube-bench summary";

/// Number of failed checks in the first summary block.
pub fn failed_checks(content: &str) -> ReportResult<u64> {
    let fail_line = Regex::new(r"^(\d+)\s+checks\s+FAIL\b")?;

    let mut lines = content.lines();
    if !lines.any(|line| line.trim_start().starts_with(SUMMARY_HEADER)) {
        return Err(ReportError::MissingSection {
            report: REPORT,
            section: SUMMARY_HEADER.to_string(),
        });
    }

    for line in lines.take(BLOCK_LINES) {
        if let Some(caps) = fail_line.captures(line.trim()) {
            let count = caps[1].parse::<u64>().map_err(|e| ReportError::Malformed {
                report: REPORT,
                detail: format!("failed-check count {:?}: {}", &caps[1], e),
            })?;
            debug!(count, "found failed-check count");
            return Ok(count);
        }
    }

    Err(ReportError::MissingSection {
        report: REPORT,
        section: "checks FAIL line".to_string(),
    })
}

pub fn evaluate(content: &str) -> ReportResult<Verdict> {
    let failed = failed_checks(content)?;
    Ok(if failed == 0 {
        Verdict::pass("failed checks: 0")
    } else {
        Verdict::fail(format!("failed checks: {}", failed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fail_line_outside_block_is_ignored() {
        let report = "== Summary total ==\n1 checks PASS\n2 checks WARN\n0 checks INFO\n5 checks PASS\n0 checks FAIL\n";
        assert!(matches!(
            failed_checks(report),
            Err(ReportError::MissingSection { .. })
        ));
    }

    #[test]
    fn first_block_wins() {
        let report = "== Summary total ==\n3 checks FAIL\n== Summary total ==\n0 checks FAIL\n";
        assert_eq!(failed_checks(report).unwrap(), 3);
    }
}
