//! HTML compliance reports

use regex::Regex;
use tracing::debug;

use crate::error::{ReportError, ReportResult};
use crate::verdict::Verdict;

/// Score a report must reach to pass
pub const DEFAULT_THRESHOLD: f64 = 100.0;

const REPORT: &str = "compliance report";

/// Text of the first `<td>` carrying the `text-center` class, parsed as a
/// percentage.
pub fn compliance_score(html: &str) -> ReportResult<f64> {
    let cell = Regex::new(
        r#"(?is)<td\b[^>]*\bclass\s*=\s*["'][^"']*\btext-center\b[^"']*["'][^>]*>(.*?)</td>"#,
    )?;
    let tags = Regex::new(r"(?s)<[^>]*>")?;

    let caps = cell.captures(html).ok_or_else(|| ReportError::MissingSection {
        report: REPORT,
        section: "td.text-center".to_string(),
    })?;
    let text = tags.replace_all(&caps[1], "");
    let text = text.trim().trim_end_matches('%').trim();
    debug!(cell = text, "compliance score cell");

    text.parse::<f64>().map_err(|e| ReportError::Malformed {
        report: REPORT,
        detail: format!("score {:?}: {}", text, e),
    })
}

pub fn evaluate(html: &str, threshold: f64) -> ReportResult<Verdict> {
    let score = compliance_score(html)?;
    Ok(if score >= threshold {
        Verdict::pass(format!("compliance score: {}", score))
    } else {
        Verdict::fail(format!("compliance score: {} (below {})", score, threshold))
    })
}
