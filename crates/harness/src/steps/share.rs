//! Sharing a file with a user and by public link
//!
//! Both links are checked from the outside: the public one without any
//! session, the internal one first anonymously (it must bounce to the login
//! page) and then as the recipient. The administrator session is restored
//! before the step returns.

use tracing::info;

use super::auth::{clear_session, sign_in, sign_out, submit_credentials};
use super::files::ensure_files_page;
use super::{actions, unobserved};
use crate::config::{Credentials, HarnessConfig};
use crate::error::HarnessError;
use crate::outcome::{contain, ActionResult};
use crate::session::Session;

pub async fn share_file<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    name: &str,
    recipient: &Credentials,
) -> ActionResult {
    contain("share_file", async {
        ensure_files_page(session, config).await?;

        let act = actions(session, config);
        let files = &config.locators.files;
        let sharing = &config.locators.sharing;
        let auth = &config.locators.auth;

        let row = act.locate(&files.row.render(name)).await?;
        act.scroll_into_view(row).await?;
        act.click(&files.share_action.render(name)).await?;

        act.type_into(&sharing.recipient_input, &recipient.username).await?;
        act.click(&sharing.save_share).await?;
        let internal = act.read_attribute(&sharing.internal_link, "href").await?;

        act.click(&sharing.create_external_link).await?;
        let external = act.read_attribute(&sharing.external_link, "href").await?;
        info!(%internal, %external, "share links created");

        sign_out(&act, config).await?;
        session.navigate(&external).await?;
        act.locate_visible(&sharing.public_file_name.render(name))
            .await
            .map_err(unobserved(format!("{} shown on public link without sign-in", name)))?;

        clear_session(session).await?;
        session.navigate(&internal).await?;
        act.locate_visible(&auth.login_button)
            .await
            .map_err(unobserved("internal link asks for sign-in"))?;
        let url = session.current_url().await?;
        if !url.contains("/login") {
            return Err(HarnessError::Verification(format!(
                "internal link served {} without authentication",
                url
            )));
        }

        submit_credentials(&act, config, recipient).await?;
        act.within(config.timeouts.presence().timeout)
            .locate_visible(&sharing.internal_share_header.render(name))
            .await
            .map_err(unobserved(format!(
                "{} opens {} via internal link",
                recipient.username, name
            )))?;

        clear_session(session).await?;
        sign_in(session, config, &config.admin).await?;

        Ok(format!("shared {} with {} and via {}", name, recipient.username, external))
    })
    .await
}
