//! Run Command
//!
//! Rehearses the file-management journey against the in-memory simulated
//! server and writes `test-results.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Args;
use futures::future::join_all;
use synccheck_harness::{
    run_file_management_cycle, write_results, HarnessConfig, ScenarioResult, SimServer,
    StepRecord, SuiteResult,
};
use tracing::info;

use crate::output::{
    mark, print_error, print_info, print_item, print_list, print_success, print_warning,
    OutputFormat, TableDisplay,
};

#[derive(Args)]
pub struct RunArgs {
    /// Number of journeys to run concurrently against one server
    #[arg(short, long, default_value_t = 1)]
    pub parallel: usize,

    /// Factor applied to every timeout and polling interval
    #[arg(long, default_value_t = 0.1)]
    pub time_scale: f64,

    /// Serve corrupted copies on download
    #[arg(long)]
    pub corrupt_downloads: bool,

    /// Directory for test-results.json [default: base_dir]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl TableDisplay for ScenarioResult {
    fn headers() -> Vec<&'static str> {
        vec!["Scenario", "Result", "Failed Step", "Kind", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.scenario.clone(),
            mark(self.passed),
            self.failed_step.clone().unwrap_or_else(|| "-".to_string()),
            self.kind.map(|k| k.to_string()).unwrap_or_else(|| "-".to_string()),
            format!("{} ms", self.duration_ms),
            self.detail.clone(),
        ]
    }
}

impl TableDisplay for StepRecord {
    fn headers() -> Vec<&'static str> {
        vec!["Step", "Result", "Duration", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            mark(self.success),
            format!("{} ms", self.duration_ms),
            self.detail.clone(),
        ]
    }
}

impl TableDisplay for SuiteResult {
    fn headers() -> Vec<&'static str> {
        vec!["Total", "Passed", "Failed", "Duration"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.total.to_string(),
            self.passed.to_string(),
            self.failed.to_string(),
            format!("{} ms", self.duration_ms),
        ]
    }
}

/// Returns whether every journey passed.
pub async fn execute(
    args: RunArgs,
    mut config: HarnessConfig,
    format: OutputFormat,
) -> Result<bool> {
    if args.parallel == 0 {
        bail!("--parallel must be at least 1");
    }
    if args.time_scale.is_nan() || args.time_scale <= 0.0 {
        bail!("--time-scale must be positive, got {}", args.time_scale);
    }

    config.timeouts = config.timeouts.scaled(args.time_scale);
    config
        .validate()
        .with_context(|| format!("invalid configuration at time scale {}", args.time_scale))?;
    let config = Arc::new(config);
    let server = SimServer::new(&config);
    server.corrupt_downloads(args.corrupt_downloads);

    info!(parallel = args.parallel, time_scale = args.time_scale, "starting rehearsal");
    print_info(&format!(
        "Rehearsing {} journey(s) against the simulated server",
        args.parallel
    ));

    let start = Instant::now();
    let runs = (0..args.parallel)
        .map(|_| run_file_management_cycle(server.open_session(), Arc::clone(&config)));
    let results = join_all(runs)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .context("preparing journey fixtures")?;
    let suite = SuiteResult::from_results(results, start.elapsed().as_millis() as u64);

    let output_dir = args.output.unwrap_or_else(|| config.base_dir.clone());
    let path = write_results(&output_dir, &suite)
        .with_context(|| format!("writing results to {}", output_dir.display()))?;

    render(&suite, format);
    for result in &suite.results {
        if let Some(e) = &result.teardown_error {
            print_warning(&format!("{}: closing session failed: {}", result.scenario, e));
        }
    }

    if suite.all_passed() {
        print_success(&format!(
            "{}/{} journeys passed, results in {}",
            suite.passed,
            suite.total,
            path.display()
        ));
    } else {
        print_error(&format!(
            "{}/{} journeys failed, results in {}",
            suite.failed,
            suite.total,
            path.display()
        ));
    }
    Ok(suite.all_passed())
}

fn render(suite: &SuiteResult, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_item(suite, format),
        OutputFormat::Table | OutputFormat::Plain => {
            print_list(&suite.results, format);
            for result in suite.results.iter().filter(|r| !r.passed) {
                println!();
                println!("Steps of failed run '{}':", result.scenario);
                print_list(&result.steps, format);
                if !result.skipped.is_empty() {
                    println!("Skipped: {}", result.skipped.join(", "));
                }
            }
        }
    }
}
