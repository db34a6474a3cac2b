//! Scenario orchestration: ordering, short-circuit, teardown

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use synccheck_harness::{
    run_scenario, steps, write_results, ActionResult, FailureKind, Scenario, Session, SimSession,
    SuiteResult,
};

use common::{server_and_session, test_config};

fn explode() -> ActionResult {
    panic!("step body exploded")
}

#[tokio::test]
async fn halts_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);
    let probe = session.clone();

    let calls = Arc::new(AtomicUsize::new(0));
    let after = Arc::clone(&calls);
    let scenario = Scenario::<SimSession>::new("short-circuit")
        .step("first", |_| async { ActionResult::ok("fine") }.boxed())
        .step("second", |_| {
            async { ActionResult::failed(FailureKind::Verification, "row missing") }.boxed()
        })
        .step("third", move |_| {
            let after = Arc::clone(&after);
            async move {
                after.fetch_add(1, Ordering::SeqCst);
                ActionResult::ok("should not run")
            }
            .boxed()
        })
        .step("fourth", |_| async { ActionResult::ok("nor this") }.boxed());

    let result = run_scenario(&scenario, session).await;

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("second"));
    assert_eq!(result.detail, "row missing");
    assert_eq!(result.kind, Some(FailureKind::Verification));
    assert_eq!(result.steps.len(), 2);
    assert_eq!(result.skipped, vec!["third".to_string(), "fourth".to_string()]);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn panicking_step_becomes_unexpected_failure() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);
    let probe = session.clone();

    let scenario = Scenario::<SimSession>::new("panics")
        .step("explode", |_| async { explode() }.boxed())
        .step("after", |_| async { ActionResult::ok("skipped") }.boxed());

    let result = run_scenario(&scenario, session).await;

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("explode"));
    assert_eq!(result.kind, Some(FailureKind::Unexpected));
    assert_eq!(result.detail, "panic: step body exploded");
    assert_eq!(result.skipped, vec!["after".to_string()]);
    assert!(probe.is_closed());
}

#[tokio::test]
async fn teardown_error_does_not_change_verdict() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);
    session.clone().quit().await.unwrap();

    let scenario = Scenario::<SimSession>::new("noop")
        .step("noop", |_| async { ActionResult::ok("nothing to do") }.boxed());
    let result = run_scenario(&scenario, session).await;

    assert!(result.passed);
    let teardown = result.teardown_error.expect("teardown error recorded");
    assert!(teardown.contains("closed"), "{}", teardown);
}

#[tokio::test]
async fn empty_scenario_passes_and_closes_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);
    let probe = session.clone();

    let scenario = Scenario::<SimSession>::new("empty");
    assert!(scenario.is_empty());
    let result = run_scenario(&scenario, session).await;

    assert!(result.passed);
    assert!(result.steps.is_empty());
    assert!(probe.is_closed());
}

#[tokio::test(start_paused = true)]
async fn real_steps_share_one_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (_server, session) = server_and_session(&config);
    let probe = session.clone();

    let login_config = Arc::clone(&config);
    let logout_config = Arc::clone(&config);
    let scenario = Scenario::<SimSession>::new("sign-in-out")
        .step("login", move |s| {
            let config = Arc::clone(&login_config);
            async move { steps::login(s, &config).await }.boxed()
        })
        .step("logout", move |s| {
            let config = Arc::clone(&logout_config);
            async move { steps::logout(s, &config).await }.boxed()
        });
    assert_eq!(scenario.step_names(), vec!["login", "logout"]);

    let result = run_scenario(&scenario, session).await;

    assert!(result.passed, "{:?}", result);
    assert_eq!(result.detail, "all 2 steps passed");
    assert!(probe.is_closed());
    assert!(probe.current_url().await.is_err());
}

#[test]
fn suite_results_are_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let suite = SuiteResult::from_results(Vec::new(), 12);
    assert!(suite.all_passed());

    let path = write_results(dir.path(), &suite).unwrap();
    assert_eq!(path.file_name().unwrap(), "test-results.json");

    let content = std::fs::read_to_string(&path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["total"], 0);
    assert_eq!(json["duration_ms"], 12);
}
