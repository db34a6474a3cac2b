//! Individual step functions against the simulated server

mod common;

use std::time::Duration;

use synccheck_harness::entity::TestUser;
use synccheck_harness::steps;
use synccheck_harness::{Credentials, FailureKind, HarnessConfig, Session};

use common::{server_and_session, test_config};

#[tokio::test(start_paused = true)]
async fn login_is_a_noop_when_already_signed_in() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);

    let first = steps::login(&session, &config).await;
    assert!(first.success, "{:?}", first);
    assert_eq!(first.detail, "signed in as admin");

    let before = session.mutation_count();
    let second = steps::login(&session, &config).await;
    assert!(second.success);
    assert!(second.detail.starts_with("already signed in"));
    assert_eq!(session.mutation_count(), before);
}

#[tokio::test(start_paused = true)]
async fn ensure_files_page_probes_before_navigating() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);

    steps::ensure_files_page(&session, &config).await.unwrap();
    let journal = session.journal();
    assert!(journal.iter().any(|e| e == "click files.tab"), "{:?}", journal);

    steps::ensure_files_page(&session, &config).await.unwrap();
    steps::ensure_files_page(&session, &config).await.unwrap();
    assert_eq!(session.journal(), journal);
}

#[tokio::test(start_paused = true)]
async fn page_check_uses_its_own_short_bound() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);
    assert!(steps::login(&session, &config).await.success);

    let started = tokio::time::Instant::now();
    steps::ensure_files_page(&session, &config).await.unwrap();
    let elapsed = started.elapsed();

    assert!(elapsed >= config.timeouts.page_probe(), "{:?}", elapsed);
    assert!(elapsed < config.timeouts.probe(), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn wrong_password_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);

    let wrong = HarnessConfig {
        admin: Credentials::new("admin", "not-the-password"),
        ..config.clone()
    };
    let result = steps::login(&session, &wrong).await;

    assert!(!result.success);
    assert_eq!(result.kind, Some(FailureKind::Verification));
    assert!(result.detail.contains("session cookie"), "{}", result.detail);
}

#[tokio::test(start_paused = true)]
async fn logout_shows_login_control() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);

    assert!(steps::login(&session, &config).await.success);
    let result = steps::logout(&session, &config).await;
    assert!(result.success, "{:?}", result);
    assert!(!steps::has_session_cookie(&session, &config).await.unwrap());
    assert!(session.signed_in_user().is_none());
}

#[tokio::test(start_paused = true)]
async fn create_user_applies_quota_and_manager() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (server, session) = server_and_session(&config);
    let user = TestUser::generate("admin", "1 GB", "admin");

    let result = steps::create_user(&session, &config, &user).await;

    assert!(result.success, "{:?}", result);
    assert!(server.has_account(&user.username));
    assert_eq!(server.account_quota(&user.username).as_deref(), Some("1 GB"));
    assert_eq!(server.account_manager(&user.username).as_deref(), Some("admin"));
}

#[tokio::test(start_paused = true)]
async fn modify_quota_is_verified_on_the_row() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (server, session) = server_and_session(&config);
    server.add_account("test_bob42", "pw");

    let result = steps::modify_user_quota(&session, &config, "test_bob42", "5 GB").await;

    assert!(result.success, "{:?}", result);
    assert_eq!(server.account_quota("test_bob42").as_deref(), Some("5 GB"));
}

#[tokio::test(start_paused = true)]
async fn delete_unknown_user_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_server, session) = server_and_session(&config);

    let result = steps::delete_user(&session, &config, "test_ghost00").await;

    assert!(!result.success);
    assert_eq!(result.kind, Some(FailureKind::NotFound));
    assert!(result.detail.contains("test_ghost00"));
}

#[tokio::test(start_paused = true)]
async fn upload_waits_for_a_slow_row() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (server, session) = server_and_session(&config);

    let local = dir.path().join("test_slow.txt");
    std::fs::write(&local, b"slow upload").unwrap();
    server.defer(config.locators.files.row.render("test_slow.txt"), 5);

    let started = tokio::time::Instant::now();
    let result = steps::upload_file(&session, &config, &local).await;

    assert!(result.success, "{:?}", result);
    assert_eq!(server.file_names("admin"), vec!["test_slow.txt".to_string()]);
    assert!(started.elapsed() >= Duration::from_millis(5 * 500));
}

#[tokio::test(start_paused = true)]
async fn delete_file_scrolls_lazy_list() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (server, session) = server_and_session(&config);
    for i in 0..45 {
        server.put_file("admin", &format!("filler_{:02}.txt", i), b"x");
    }
    server.put_file("admin", "zz_target.txt", b"target");

    let result = steps::delete_file(&session, &config, "zz_target.txt").await;

    assert!(result.success, "{:?}", result);
    let remaining = server.file_names("admin");
    assert_eq!(remaining.len(), 45);
    assert!(!remaining.contains(&"zz_target.txt".to_string()));
    assert!(session
        .journal()
        .iter()
        .filter(|e| e.as_str() == "script scroll-to-bottom")
        .count()
        >= 2);
}

#[tokio::test(start_paused = true)]
async fn download_and_verify_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (server, session) = server_and_session(&config);

    let local = dir.path().join("test_round_trip.bin");
    std::fs::write(&local, (0..4096u32).map(|i| (i % 256) as u8).collect::<Vec<_>>()).unwrap();

    assert!(steps::upload_file(&session, &config, &local).await.success);
    let downloaded = steps::download_file(&session, &config, "test_round_trip.bin").await;
    assert!(downloaded.success, "{:?}", downloaded);
    assert!(config.download_dir().join("test_round_trip.bin").is_file());

    let verified = steps::verify_integrity(&config, &local).await;
    assert!(verified.success, "{:?}", verified);

    server.corrupt_downloads(true);
    assert!(steps::download_file(&session, &config, "test_round_trip.bin").await.success);
    let mismatch = steps::verify_integrity(&config, &local).await;
    assert_eq!(mismatch.kind, Some(FailureKind::Verification));
}

#[tokio::test(start_paused = true)]
async fn share_restores_admin_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (server, session) = server_and_session(&config);
    server.add_account("test_eve17", "eve-pass");
    server.put_file("admin", "test_shared.txt", b"shared");

    let recipient = Credentials::new("test_eve17", "eve-pass");
    let result = steps::share_file(&session, &config, "test_shared.txt", &recipient).await;

    assert!(result.success, "{:?}", result);
    assert!(result.detail.contains("/s/"));
    assert_eq!(session.signed_in_user().as_deref(), Some("admin"));
    assert!(session.current_url().await.unwrap().ends_with("/apps/dashboard/"));
}
