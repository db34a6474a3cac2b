//! The canonical file-management user journey

use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, warn};

use crate::config::{Credentials, HarnessConfig};
use crate::entity::{TestFile, TestUser};
use crate::error::HarnessResult;
use crate::runner::{run_scenario, ScenarioResult};
use crate::scenario::Scenario;
use crate::session::Session;
use crate::steps;

pub const FILE_MANAGEMENT_CYCLE: &str = "file_management_cycle";

/// Entities generated for one run of the journey
#[derive(Debug, Clone)]
pub struct JourneyFixtures {
    pub user: TestUser,
    pub medium: TestFile,
    pub large: TestFile,
}

impl JourneyFixtures {
    /// Generate a user and write both test files.
    pub fn prepare(config: &HarnessConfig) -> HarnessResult<Self> {
        let nu = &config.new_user;
        let files = &config.files;
        let dir = config.created_files_dir();

        let user = TestUser::generate(&nu.group, &nu.quota, &nu.manager);
        let medium = TestFile::create(
            &dir,
            &files.medium_base_name,
            &files.extension,
            files.medium_size_mb,
        )?;
        let large = match TestFile::create(
            &dir,
            &files.large_base_name,
            &files.extension,
            files.large_size_mb,
        ) {
            Ok(large) => large,
            Err(e) => {
                if let Err(cleanup) = medium.remove() {
                    warn!(file = %medium.name, error = %cleanup, "removing fixture failed");
                }
                return Err(e);
            }
        };

        info!(user = %user.username, medium = %medium.name, large = %large.name, "fixtures ready");
        Ok(Self { user, medium, large })
    }

    /// Remove local originals and downloaded copies.
    pub fn cleanup(&self, config: &HarnessConfig) -> HarnessResult<()> {
        for file in [&self.medium, &self.large] {
            file.remove()?;
            let downloaded = config.download_dir().join(&file.name);
            if downloaded.exists() {
                std::fs::remove_file(&downloaded)?;
            }
        }
        Ok(())
    }

    pub fn recipient(&self) -> Credentials {
        Credentials::new(self.user.username.clone(), self.user.password.clone())
    }
}

/// Build a step closure. Each listed capture is cloned into the closure and
/// again into every future it returns.
macro_rules! step_fn {
    (|$s:pat_param| [$($cap:ident),*] $body:expr) => {{
        $(let $cap = $cap.clone();)*
        move |$s| {
            $(let $cap = $cap.clone();)*
            async move { $body }.boxed()
        }
    }};
}

/// login, create-user, modify-quota, upload, download and verify both
/// files, share the medium one, delete both, delete-user, logout
pub fn file_management_cycle<S: Session + 'static>(
    config: Arc<HarnessConfig>,
    fixtures: &JourneyFixtures,
) -> Scenario<S> {
    let medium_path = fixtures.medium.path.clone();
    let medium_name = fixtures.medium.name.clone();
    let large_path = fixtures.large.path.clone();
    let large_name = fixtures.large.name.clone();
    let user = fixtures.user.clone();
    let username = user.username.clone();
    let recipient = fixtures.recipient();

    Scenario::new(FILE_MANAGEMENT_CYCLE)
        .step("login", step_fn!(|s| [config] steps::login(s, &config).await))
        .step(
            "create-user",
            step_fn!(|s| [config, user] steps::create_user(s, &config, &user).await),
        )
        .step(
            "modify-quota",
            step_fn!(|s| [config, username] {
                let quota = &config.new_user.modified_quota;
                steps::modify_user_quota(s, &config, &username, quota).await
            }),
        )
        .step(
            "upload-medium",
            step_fn!(|s| [config, medium_path] steps::upload_file(s, &config, &medium_path).await),
        )
        .step(
            "upload-large",
            step_fn!(|s| [config, large_path] steps::upload_file(s, &config, &large_path).await),
        )
        .step(
            "download-medium",
            step_fn!(|s| [config, medium_name] {
                steps::download_file(s, &config, &medium_name).await
            }),
        )
        .step(
            "download-large",
            step_fn!(|s| [config, large_name] steps::download_file(s, &config, &large_name).await),
        )
        .step(
            "verify-integrity-medium",
            step_fn!(|_| [config, medium_path] {
                steps::verify_integrity(&config, &medium_path).await
            }),
        )
        .step(
            "verify-integrity-large",
            step_fn!(|_| [config, large_path] steps::verify_integrity(&config, &large_path).await),
        )
        .step(
            "share-medium",
            step_fn!(|s| [config, medium_name, recipient] {
                steps::share_file(s, &config, &medium_name, &recipient).await
            }),
        )
        .step(
            "delete-medium",
            step_fn!(|s| [config, medium_name] steps::delete_file(s, &config, &medium_name).await),
        )
        .step(
            "delete-large",
            step_fn!(|s| [config, large_name] steps::delete_file(s, &config, &large_name).await),
        )
        .step(
            "delete-user",
            step_fn!(|s| [config, username] steps::delete_user(s, &config, &username).await),
        )
        .step("logout", step_fn!(|s| [config] steps::logout(s, &config).await))
}

/// Validate `config`, prepare fixtures, run the journey on `session` and
/// clean up local files. The session is closed in every case.
pub async fn run_file_management_cycle<S: Session + 'static>(
    session: S,
    config: Arc<HarnessConfig>,
) -> HarnessResult<ScenarioResult> {
    let fixtures = match config.validate().and_then(|()| JourneyFixtures::prepare(&config)) {
        Ok(fixtures) => fixtures,
        Err(e) => {
            if let Err(quit) = session.quit().await {
                warn!(error = %quit, "closing session failed");
            }
            return Err(e);
        }
    };

    let scenario = file_management_cycle(Arc::clone(&config), &fixtures);
    let result = run_scenario(&scenario, session).await;

    if let Err(e) = fixtures.cleanup(&config) {
        warn!(error = %e, "fixture cleanup failed");
    }
    Ok(result)
}
