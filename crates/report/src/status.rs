//! YAML results documents with a top-level `status`

use serde::Deserialize;

use crate::error::{ReportError, ReportResult};
use crate::verdict::Verdict;

pub const PASSED: &str = "passed";

#[derive(Debug, Deserialize)]
struct StatusDocument {
    status: Option<String>,
}

pub fn evaluate(content: &str) -> ReportResult<Verdict> {
    let doc: StatusDocument = serde_yaml::from_str(content)?;
    let status = doc.status.ok_or_else(|| ReportError::MissingSection {
        report: "status document",
        section: "status".to_string(),
    })?;

    Ok(if status == PASSED {
        Verdict::pass("systemd tests passed")
    } else {
        Verdict::fail(format!("systemd tests failed (status: {})", status))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_fields_are_ignored() {
        let doc = "name: systemd-logs\nstatus: passed\nitems:\n  - name: node-1\n    status: passed\n";
        assert!(evaluate(doc).unwrap().passed);
    }

    #[test]
    fn missing_status_is_an_error() {
        assert!(matches!(
            evaluate("name: systemd-logs\n"),
            Err(ReportError::MissingSection { .. })
        ));
    }
}
