//! Plain-text end-to-end logs

use crate::verdict::Verdict;

/// A line containing any of these marks the suite as failed.
pub const FAILURE_MARKERS: [&str; 2] = ["FAIL", "Test Suite Failed"];

pub fn evaluate(content: &str) -> Verdict {
    let hit = content
        .lines()
        .enumerate()
        .find(|(_, line)| FAILURE_MARKERS.iter().any(|m| line.contains(m)));

    match hit {
        Some((index, line)) => Verdict::fail(format!(
            "end-to-end test suite failed (line {}: {})",
            index + 1,
            line.trim()
        )),
        None => Verdict::pass("tests passed"),
    }
}
