//! File list steps: upload, download, integrity, delete

use std::path::Path;

use tokio::time::sleep;
use tracing::{debug, info};

use super::auth::ensure_signed_in;
use super::{actions, unobserved};
use crate::actions::{scripts, Actions};
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::integrity::verify_round_trip;
use crate::outcome::{contain, ActionResult};
use crate::session::Session;

/// Upper bound on lazy-list scroll rounds
const MAX_SCROLL_ROUNDS: usize = 50;

/// Signed in and looking at the file list. Probes only when already there.
pub async fn ensure_files_page<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    ensure_signed_in(session, config).await?;

    let act = actions(session, config);
    let files = &config.locators.files;
    if act.is_present(&files.files_container, config.timeouts.page_probe()).await {
        debug!("already on files page");
        return Ok(());
    }

    if !act.is_present(&files.files_tab, config.timeouts.page_probe()).await {
        session.navigate(config.base_url()).await?;
    }
    act.click(&files.files_tab).await?;
    act.locate_visible(&files.files_container).await?;
    Ok(())
}

pub async fn upload_file<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    path: &Path,
) -> ActionResult {
    contain("upload_file", async {
        let name = file_name(path)?;
        ensure_files_page(session, config).await?;

        let act = actions(session, config);
        let files = &config.locators.files;
        session
            .execute_script(&scripts::reveal_upload_input(&files.upload_input.value), &[])
            .await?;
        let input = act.locate_visible(&files.upload_input).await?;
        session.send_keys(input, &path.to_string_lossy()).await?;

        act.within(config.timeouts.upload().timeout)
            .locate(&files.row.render(&name))
            .await
            .map_err(unobserved(format!("{} listed after upload", name)))?;
        Ok(format!("uploaded {}", name))
    })
    .await
}

pub async fn download_file<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    name: &str,
) -> ActionResult {
    contain("download_file", async {
        ensure_files_page(session, config).await?;

        let act = actions(session, config);
        let files = &config.locators.files;
        let row = act.locate(&files.row.render(name)).await?;
        act.scroll_into_view(row).await?;
        act.click(&files.actions_menu.render(name)).await?;
        act.click(&files.download_action.render(name)).await?;

        let target = config.download_dir().join(name);
        let target_ref = target.as_path();
        config
            .timeouts
            .download()
            .until(&format!("download of {}", name), move || async move {
                Ok(target_ref.is_file().then_some(()))
            })
            .await
            .map_err(unobserved(format!(
                "{} present in {}",
                name,
                config.download_dir().display()
            )))?;

        info!(file = %target.display(), "download landed");
        Ok(format!("downloaded {} to {}", name, target.display()))
    })
    .await
}

/// Compare the uploaded original with the copy in the download directory.
pub async fn verify_integrity(config: &HarnessConfig, original: &Path) -> ActionResult {
    contain("verify_integrity", async {
        let name = file_name(original)?;
        let downloaded = config.download_dir().join(&name);
        let detail = verify_round_trip(original, &downloaded)?;
        Ok(format!("{}: {}", name, detail))
    })
    .await
}

pub async fn delete_file<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    name: &str,
) -> ActionResult {
    contain("delete_file", async {
        ensure_files_page(session, config).await?;

        let act = actions(session, config);
        let files = &config.locators.files;
        let rows = load_all_rows(&act, config).await?;
        debug!(rows, "file list fully loaded");

        let row_locator = files.row.render(name);
        let row = act.locate(&row_locator).await?;
        act.scroll_into_view(row).await?;
        act.click(&files.actions_menu.render(name)).await?;
        act.click(&files.delete_action).await?;

        let verify = act.within(config.timeouts.presence().timeout);
        verify
            .wait_stale(row)
            .await
            .map_err(unobserved(format!("row of {} detached after delete", name)))?;
        verify
            .wait_absent(&row_locator)
            .await
            .map_err(unobserved(format!("{} no longer listed", name)))?;
        Ok(format!("deleted {}", name))
    })
    .await
}

/// Scroll the lazily rendered list until the row count stops growing.
async fn load_all_rows<S: Session + ?Sized>(
    act: &Actions<'_, S>,
    config: &HarnessConfig,
) -> HarnessResult<usize> {
    let session = act.session();
    let files = &config.locators.files;
    let mut previous = None;

    for _ in 0..MAX_SCROLL_ROUNDS {
        let rows = session.find_all(&files.list_rows).await?.len();
        if previous == Some(rows) {
            return Ok(rows);
        }
        previous = Some(rows);

        let container = act.locate(&files.app_content).await?;
        session
            .execute_script(scripts::SCROLL_TO_BOTTOM, &[container])
            .await?;
        sleep(act.policy().interval).await;
    }
    Ok(previous.unwrap_or_default())
}

fn file_name(path: &Path) -> HarnessResult<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| HarnessError::InvalidConfig(format!("{} has no file name", path.display())))
}
