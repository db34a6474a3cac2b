//! Sign-in and sign-out

use tracing::{debug, info};

use super::{actions, unobserved};
use crate::actions::Actions;
use crate::config::{Credentials, HarnessConfig};
use crate::error::{HarnessError, HarnessResult};
use crate::outcome::{contain, ActionResult};
use crate::session::Session;

/// Sign in as the configured administrator unless already authenticated.
pub async fn login<S: Session + ?Sized>(session: &S, config: &HarnessConfig) -> ActionResult {
    contain("login", async {
        if has_session_cookie(session, config).await? {
            return Ok(format!("already signed in as {}", config.admin.username));
        }
        sign_in(session, config, &config.admin).await?;
        Ok(format!("signed in as {}", config.admin.username))
    })
    .await
}

/// Open the settings menu, sign out and expect the login control.
pub async fn logout<S: Session + ?Sized>(session: &S, config: &HarnessConfig) -> ActionResult {
    contain("logout", async {
        sign_out(&actions(session, config), config).await?;
        Ok("signed out".to_string())
    })
    .await
}

/// Single cookie read, no waiting.
pub async fn has_session_cookie<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
) -> HarnessResult<bool> {
    let cookies = session.cookies().await?;
    Ok(cookies
        .iter()
        .any(|c| c.name == config.session_cookie && !c.value.is_empty()))
}

pub(super) async fn ensure_signed_in<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    if has_session_cookie(session, config).await? {
        return Ok(());
    }
    debug!("no session cookie, signing in");
    sign_in(session, config, &config.admin).await
}

/// Load the start page and sign in.
pub(super) async fn sign_in<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    credentials: &Credentials,
) -> HarnessResult<()> {
    session.navigate(config.base_url()).await?;
    let act = actions(session, config);
    wait_page_loaded(&act, config).await?;
    submit_credentials(&act, config, credentials).await
}

/// Fill and submit the login form on the current page.
pub(super) async fn submit_credentials<S: Session + ?Sized>(
    act: &Actions<'_, S>,
    config: &HarnessConfig,
    credentials: &Credentials,
) -> HarnessResult<()> {
    let auth = &config.locators.auth;
    act.replace_text(&auth.username_input, &credentials.username).await?;
    act.replace_text(&auth.password_input, &credentials.password).await?;
    act.click(&auth.login_button).await?;

    let session = act.session();
    config
        .timeouts
        .login()
        .until("session cookie", move || async move {
            Ok(has_session_cookie(session, config).await?.then_some(()))
        })
        .await
        .map_err(unobserved(format!(
            "{} signed in with a session cookie",
            credentials.username
        )))?;

    if act.is_present(&auth.welcome_modal_close, config.timeouts.probe()).await {
        act.click(&auth.welcome_modal_close).await?;
        debug!("dismissed welcome modal");
    }

    info!(user = %credentials.username, "signed in");
    Ok(())
}

/// Either page marker will do: login form or dashboard.
async fn wait_page_loaded<S: Session + ?Sized>(
    act: &Actions<'_, S>,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    let session = act.session();
    let markers = &config.locators.auth.page_loaded;
    act.policy()
        .until("start page", move || async move {
            for marker in markers {
                if session.find(marker).await.is_ok() {
                    return Ok(Some(()));
                }
            }
            Ok(None)
        })
        .await
        .map_err(|e| match e {
            HarnessError::Timeout { elapsed_ms, .. } => HarnessError::NotFound(format!(
                "none of {} page markers after {} ms",
                markers.len(),
                elapsed_ms
            )),
            other => other,
        })
}

pub(super) async fn sign_out<S: Session + ?Sized>(
    act: &Actions<'_, S>,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    let auth = &config.locators.auth;
    if act.is_present(&auth.settings_menu_closed, config.timeouts.probe()).await {
        act.click(&auth.settings_menu_closed).await?;
    }
    act.click(&auth.logout_link).await?;
    act.locate_visible(&auth.login_button)
        .await
        .map_err(unobserved("login control visible after sign-out"))?;
    info!("signed out");
    Ok(())
}

/// Forget the current identity without going through the UI.
pub(super) async fn clear_session<S: Session + ?Sized>(session: &S) -> HarnessResult<()> {
    session.delete_cookies().await
}
