//! Scenario orchestrator and suite results

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::Instant;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{FailureKind, HarnessResult};
use crate::outcome::{panic_message, ActionResult};
use crate::scenario::Scenario;
use crate::session::Session;

/// Outcome of one executed step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub success: bool,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub duration_ms: u64,
}

/// Verdict of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub passed: bool,
    /// First step that failed; later steps never ran
    pub failed_step: Option<String>,
    pub detail: String,
    pub kind: Option<FailureKind>,
    pub steps: Vec<StepRecord>,
    pub skipped: Vec<String>,
    pub duration_ms: u64,
    /// Closing the session failed; does not affect `passed`
    pub teardown_error: Option<String>,
}

/// Run every step in order, halting at the first failure, then close the
/// session whatever happened.
pub async fn run_scenario<S: Session>(scenario: &Scenario<S>, session: S) -> ScenarioResult {
    let start = Instant::now();
    info!(scenario = %scenario.name, steps = scenario.len(), "starting scenario");

    let mut records = Vec::with_capacity(scenario.len());
    let mut failed_at = None;

    for (index, step) in scenario.steps.iter().enumerate() {
        let step_start = Instant::now();
        let run = &step.run;
        let session_ref = &session;
        let outcome = match AssertUnwindSafe(async move { run(session_ref).await })
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => ActionResult::failed(
                FailureKind::Unexpected,
                format!("panic: {}", panic_message(payload.as_ref())),
            ),
        };

        let success = outcome.success;
        records.push(StepRecord {
            name: step.name.clone(),
            success,
            detail: outcome.detail,
            kind: outcome.kind,
            duration_ms: step_start.elapsed().as_millis() as u64,
        });

        if !success {
            failed_at = Some(index);
            break;
        }
    }

    let teardown_error = match session.quit().await {
        Ok(()) => None,
        Err(e) => {
            warn!(scenario = %scenario.name, error = %e, "closing session failed");
            Some(e.to_string())
        }
    };

    let duration_ms = start.elapsed().as_millis() as u64;
    match failed_at {
        None => {
            info!(scenario = %scenario.name, duration_ms, "✓ scenario passed");
            ScenarioResult {
                scenario: scenario.name.clone(),
                passed: true,
                failed_step: None,
                detail: format!("all {} steps passed", records.len()),
                kind: None,
                steps: records,
                skipped: Vec::new(),
                duration_ms,
                teardown_error,
            }
        }
        Some(index) => {
            let failed = &records[index];
            let skipped: Vec<String> = scenario.steps[index + 1..]
                .iter()
                .map(|s| s.name.clone())
                .collect();
            error!(
                scenario = %scenario.name,
                step = %failed.name,
                kind = ?failed.kind,
                skipped = skipped.len(),
                "✗ {}",
                failed.detail
            );
            ScenarioResult {
                scenario: scenario.name.clone(),
                passed: false,
                failed_step: Some(failed.name.clone()),
                detail: failed.detail.clone(),
                kind: failed.kind,
                steps: records,
                skipped,
                duration_ms,
                teardown_error,
            }
        }
    }
}

/// Aggregate of several scenario runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn from_results(results: Vec<ScenarioResult>, duration_ms: u64) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        info!(
            "Scenario results: {} passed, {} failed ({} ms)",
            passed,
            results.len() - passed,
            duration_ms
        );
        Self {
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms,
            results,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Write suite results to `test-results.json` under `output_dir`.
pub fn write_results(output_dir: &Path, results: &SuiteResult) -> HarnessResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}
