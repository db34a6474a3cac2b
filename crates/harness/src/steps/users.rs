//! User administration steps

use tracing::debug;

use super::auth::ensure_signed_in;
use super::{actions, unobserved};
use crate::config::HarnessConfig;
use crate::entity::TestUser;
use crate::error::HarnessResult;
use crate::outcome::{contain, ActionResult};
use crate::session::{Session, KEY_ENTER};

/// Signed in and looking at the user list. Probes only when already there.
pub async fn ensure_users_page<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
) -> HarnessResult<()> {
    ensure_signed_in(session, config).await?;

    let act = actions(session, config);
    let users = &config.locators.users;
    if act.is_present(&users.user_list, config.timeouts.page_probe()).await {
        debug!("already on users page");
        return Ok(());
    }

    if !act.is_present(&users.users_link, config.timeouts.page_probe()).await {
        session.navigate(config.base_url()).await?;
    }
    act.click(&users.users_link).await?;
    act.locate_visible(&users.user_list).await?;
    Ok(())
}

pub async fn create_user<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    user: &TestUser,
) -> ActionResult {
    contain("create_user", async {
        ensure_users_page(session, config).await?;

        let act = actions(session, config);
        let users = &config.locators.users;
        act.click(&users.new_user_button).await?;
        act.replace_text(&users.username_input, &user.username).await?;
        act.replace_text(&users.display_name_input, &user.display_name).await?;
        act.replace_text(&users.password_input, &user.password).await?;
        act.replace_text(&users.email_input, &user.email).await?;

        act.click(&users.group_dropdown).await?;
        act.click(&users.group_option.render(&user.group)).await?;

        act.click(&users.quota_dropdown).await?;
        act.type_into(&users.quota_input, &format!("{}{}", user.quota, KEY_ENTER))
            .await?;

        act.type_into(&users.manager_input, &user.manager).await?;
        act.click(&users.manager_option.render(&user.manager)).await?;

        act.click(&users.submit).await?;
        session.refresh().await?;
        act.wait_document_ready().await?;

        act.within(config.timeouts.presence().timeout)
            .locate(&users.row.render(&user.username))
            .await
            .map_err(unobserved(format!("row for new user {}", user.username)))?;
        Ok(format!("created user {}", user.username))
    })
    .await
}

pub async fn modify_user_quota<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    username: &str,
    quota: &str,
) -> ActionResult {
    contain("modify_user_quota", async {
        ensure_users_page(session, config).await?;

        let act = actions(session, config);
        let users = &config.locators.users;
        act.click(&users.edit_mode_button).await?;
        act.replace_text(&users.quota_field.render(username), &format!("{}{}", quota, KEY_ENTER))
            .await?;
        act.click(&users.save_edit).await?;

        let row = users.row.render(username);
        let row = &row;
        config
            .timeouts
            .presence()
            .until(&format!("quota {} on {}", quota, row), move || async move {
                let element = session.find(row).await?;
                let current = session.attribute(element, "data-quota").await?;
                Ok((current.as_deref() == Some(quota)).then_some(()))
            })
            .await
            .map_err(unobserved(format!("{} has quota {}", username, quota)))?;
        Ok(format!("quota of {} set to {}", username, quota))
    })
    .await
}

pub async fn delete_user<S: Session + ?Sized>(
    session: &S,
    config: &HarnessConfig,
    username: &str,
) -> ActionResult {
    contain("delete_user", async {
        ensure_users_page(session, config).await?;

        let act = actions(session, config);
        let users = &config.locators.users;
        let row_locator = users.row.render(username);
        let row = act.locate(&row_locator).await?;
        act.scroll_into_view(row).await?;
        act.click(&users.row_actions.render(username)).await?;
        act.click(&users.delete_menu_item).await?;
        act.click(&users.confirm_delete).await?;

        session.refresh().await?;
        act.wait_document_ready().await?;
        act.within(config.timeouts.presence().timeout)
            .wait_absent(&row_locator)
            .await
            .map_err(unobserved(format!("{} removed from user list", username)))?;
        Ok(format!("deleted user {}", username))
    })
    .await
}
