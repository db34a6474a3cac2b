//! Full file-management journey against the simulated server

mod common;

use std::sync::Arc;

use synccheck_harness::{
    run_file_management_cycle, FailureKind, HarnessError, JourneyFixtures,
};

use common::{server_and_session, test_config};

const JOURNEY: [&str; 14] = [
    "login",
    "create-user",
    "modify-quota",
    "upload-medium",
    "upload-large",
    "download-medium",
    "download-large",
    "verify-integrity-medium",
    "verify-integrity-large",
    "share-medium",
    "delete-medium",
    "delete-large",
    "delete-user",
    "logout",
];

#[tokio::test(start_paused = true)]
async fn full_journey_passes() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (server, session) = server_and_session(&config);

    let result = run_file_management_cycle(session.clone(), Arc::clone(&config))
        .await
        .unwrap();

    assert!(result.passed, "journey failed: {:?}", result);
    let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, JOURNEY);
    assert!(result.steps.iter().all(|s| s.success));
    assert!(result.failed_step.is_none());
    assert!(result.skipped.is_empty());
    assert!(result.teardown_error.is_none());

    assert!(session.is_closed());
    assert!(server.file_names("admin").is_empty());

    let leftovers = std::fs::read_dir(config.created_files_dir()).unwrap().count();
    assert_eq!(leftovers, 0);
}

#[tokio::test(start_paused = true)]
async fn corrupted_download_fails_integrity() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (server, session) = server_and_session(&config);
    server.corrupt_downloads(true);

    let result = run_file_management_cycle(session.clone(), config).await.unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("verify-integrity-medium"));
    assert_eq!(result.kind, Some(FailureKind::Verification));
    assert!(result.detail.contains("sha256 mismatch"), "{}", result.detail);
    assert_eq!(result.steps.len(), 8);
    assert_eq!(result.skipped, JOURNEY[8..].to_vec());
    assert!(session.is_closed());
}

#[tokio::test(start_paused = true)]
async fn interaction_error_is_attributed_with_its_text() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (server, session) = server_and_session(&config);
    server.fail_on(config.locators.files.upload_input.clone(), "storage backend offline");

    let result = run_file_management_cycle(session.clone(), Arc::clone(&config))
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("upload-medium"));
    assert_eq!(result.kind, Some(FailureKind::Unexpected));
    assert!(result.detail.contains("storage backend offline"), "{}", result.detail);
    assert_eq!(result.steps.len(), 4);
    assert!(server.file_names("admin").is_empty());
    assert!(session.is_closed());
}

#[tokio::test(start_paused = true)]
async fn panic_inside_step_is_contained() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (server, session) = server_and_session(&config);
    server.panic_on(config.locators.users.new_user_button.clone());

    let result = run_file_management_cycle(session.clone(), Arc::clone(&config))
        .await
        .unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("create-user"));
    assert_eq!(result.kind, Some(FailureKind::Unexpected));
    assert!(result.detail.starts_with("panic:"), "{}", result.detail);
    assert!(result.detail.contains("simulated crash"));
    assert_eq!(result.skipped.len(), JOURNEY.len() - 2);
    assert!(session.is_closed());
}

#[tokio::test(start_paused = true)]
async fn refused_user_deletion_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (server, session) = server_and_session(&config);
    server.refuse_user_deletion(true);

    let result = run_file_management_cycle(session, config).await.unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("delete-user"));
    assert_eq!(result.kind, Some(FailureKind::Verification));
    assert_eq!(result.skipped, vec!["logout".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn internal_link_served_without_login_fails_share() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let (server, session) = server_and_session(&config);
    server.open_internal_links(true);

    let result = run_file_management_cycle(session, config).await.unwrap();

    assert!(!result.passed);
    assert_eq!(result.failed_step.as_deref(), Some("share-medium"));
    assert_eq!(result.kind, Some(FailureKind::Verification));
    assert!(result.detail.contains("internal link"), "{}", result.detail);
}

#[tokio::test(start_paused = true)]
async fn concurrent_runs_on_one_server_both_pass() {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(test_config(dir.path()));
    let server = synccheck_harness::SimServer::new(&config);

    let runs =
        (0..2).map(|_| run_file_management_cycle(server.open_session(), Arc::clone(&config)));
    let results = futures::future::join_all(runs).await;

    for result in results {
        let result = result.unwrap();
        assert!(result.passed, "concurrent run failed: {:?}", result);
    }
    assert!(server.file_names("admin").is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_locators_are_rejected_before_any_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.locators.files.files_tab.value = String::new();
    let config = Arc::new(config);
    let (_server, session) = server_and_session(&config);

    let err = run_file_management_cycle(session.clone(), Arc::clone(&config))
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::InvalidConfig(_)), "{}", err);
    assert!(session.is_closed());
    assert!(session.journal().iter().all(|e| e == "quit"));
    assert!(!config.created_files_dir().exists());
}

#[test]
fn failed_fixture_does_not_leave_the_first_file_behind() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.files.large_base_name = "missing/test_large_file".to_string();

    assert!(JourneyFixtures::prepare(&config).is_err());

    let leftovers = std::fs::read_dir(config.created_files_dir()).unwrap().count();
    assert_eq!(leftovers, 0);
}
