//! Typed locator catalogue
//!
//! Every UI role the step functions touch has a named field here. Defaults
//! target the stock Nextcloud web UI; any field can be overridden from the
//! `locators:` section of the harness config. Per-entity locators (a user
//! row, a file row) are templates with a `{name}` placeholder.

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

/// Placeholder substituted by [`LocatorTemplate::render`]
pub const NAME_PLACEHOLDER: &str = "{name}";

/// Selector strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum By {
    Id,
    #[serde(rename = "xpath")]
    XPath,
    Css,
}

impl By {
    pub fn as_str(&self) -> &'static str {
        match self {
            By::Id => "id",
            By::XPath => "xpath",
            By::Css => "css",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: By,
    pub value: String,
}

impl Locator {
    pub fn id(value: impl Into<String>) -> Self {
        Self { by: By::Id, value: value.into() }
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self { by: By::XPath, value: value.into() }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self { by: By::Css, value: value.into() }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.by.as_str(), self.value)
    }
}

/// A locator with a `{name}` slot for an entity identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorTemplate(pub Locator);

impl LocatorTemplate {
    pub fn xpath(value: impl Into<String>) -> Self {
        Self(Locator::xpath(value))
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self(Locator::css(value))
    }

    /// Substitute the entity name. Names are matched exactly.
    pub fn render(&self, name: &str) -> Locator {
        Locator {
            by: self.0.by,
            value: self.0.value.replace(NAME_PLACEHOLDER, name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthLocators {
    /// Any of these marks a fully loaded start page
    pub page_loaded: Vec<Locator>,
    pub username_input: Locator,
    pub password_input: Locator,
    pub login_button: Locator,
    pub welcome_modal_close: Locator,
    pub settings_menu_open: Locator,
    pub settings_menu_closed: Locator,
    pub logout_link: Locator,
    pub header: Locator,
}

impl Default for AuthLocators {
    fn default() -> Self {
        Self {
            page_loaded: vec![Locator::id("body-login"), Locator::id("app-dashboard")],
            username_input: Locator::id("user"),
            password_input: Locator::id("password"),
            login_button: Locator::xpath(
                "//button[@class='button-vue button-vue--icon-and-text button-vue--vue-primary button-vue--wide']",
            ),
            welcome_modal_close: Locator::css("#modal-description-lyiks .modal-container__close"),
            settings_menu_open: Locator::xpath(
                "//a[@aria-label='Open settings menu' and @aria-expanded='true']",
            ),
            settings_menu_closed: Locator::xpath(
                "//a[@aria-label='Open settings menu' and @aria-expanded='false']",
            ),
            logout_link: Locator::xpath(
                "//a[starts-with(@href, '/logout?')] | //a[contains(@href, '/logout')] | //a[contains(text(), 'Log out')]",
            ),
            header: Locator::id("header"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLocators {
    pub files_tab: Locator,
    pub files_container: Locator,
    pub app_content: Locator,
    /// Hidden `<input type=file>`; must be an id locator so it can be revealed
    pub upload_input: Locator,
    pub list_rows: Locator,
    pub row: LocatorTemplate,
    pub actions_menu: LocatorTemplate,
    pub download_action: LocatorTemplate,
    pub delete_action: Locator,
    pub share_action: LocatorTemplate,
}

impl Default for FileLocators {
    fn default() -> Self {
        Self {
            files_tab: Locator::xpath("//a[@aria-label='Files']"),
            files_container: Locator::id("app-content-files"),
            app_content: Locator::xpath("//*[@id='app-content']"),
            upload_input: Locator::id("file_upload_start"),
            list_rows: Locator::css("tbody.files-fileList > tr"),
            row: LocatorTemplate::xpath("//tr[@data-file='{name}']"),
            actions_menu: LocatorTemplate::xpath(
                "//tr[@data-file='{name}']//a[@data-action='menu']",
            ),
            download_action: LocatorTemplate::xpath(
                "//tr[@data-file='{name}']//a[@data-action='Download']",
            ),
            delete_action: Locator::xpath(
                "//div[contains(@class, 'fileActionsMenu')]//a[contains(@class, 'action-delete') and @data-action='Delete']",
            ),
            share_action: LocatorTemplate::xpath(
                "//tr[@data-file='{name}']//a[contains(@class, 'action-share')]",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserLocators {
    pub users_link: Locator,
    pub user_list: Locator,
    pub new_user_button: Locator,
    pub username_input: Locator,
    pub display_name_input: Locator,
    pub password_input: Locator,
    pub email_input: Locator,
    pub group_dropdown: Locator,
    pub group_option: LocatorTemplate,
    pub quota_dropdown: Locator,
    pub quota_input: Locator,
    pub manager_input: Locator,
    pub manager_option: LocatorTemplate,
    pub submit: Locator,
    pub row: LocatorTemplate,
    pub row_actions: LocatorTemplate,
    pub delete_menu_item: Locator,
    pub confirm_delete: Locator,
    pub edit_mode_button: Locator,
    pub quota_field: LocatorTemplate,
    pub save_edit: Locator,
}

impl Default for UserLocators {
    fn default() -> Self {
        Self {
            users_link: Locator::xpath("//a[@href='/settings/users']"),
            user_list: Locator::xpath("//div[@class='user-list-grid']"),
            new_user_button: Locator::xpath("//button[@id='new-user-button']"),
            username_input: Locator::xpath("//input[@id='newusername']"),
            display_name_input: Locator::xpath("//input[@id='newdisplayname']"),
            password_input: Locator::xpath("//input[@id='newuserpassword']"),
            email_input: Locator::xpath("//input[@id='newemail']"),
            group_dropdown: Locator::xpath(
                "//div[@class='multiselect multiselect-vue multiselect--multiple']",
            ),
            group_option: LocatorTemplate::xpath(
                "//span[@class='name-parts__first' and text()='{name}']",
            ),
            quota_dropdown: Locator::xpath("//div[@class='quota modal__item']"),
            quota_input: Locator::xpath("//input[@placeholder='Select user quota']"),
            manager_input: Locator::xpath("//input[@placeholder='Select user manager']"),
            manager_option: LocatorTemplate::xpath(
                "//li[@role='option' and contains(@class, 'multiselect__element')]//span[contains(@class, 'option') and @id='{name}']",
            ),
            submit: Locator::xpath("//button[@id='newsubmit']"),
            row: LocatorTemplate::xpath("//div[@class='row' and @data-id='{name}']"),
            row_actions: LocatorTemplate::xpath(
                "//div[@data-id='{name}']//button[@aria-label='Toggle user actions menu']",
            ),
            delete_menu_item: Locator::xpath(
                "//div[@class='popovermenu open']//button[@class='menuitem focusable']",
            ),
            confirm_delete: Locator::xpath("//button[@class='error primary']"),
            edit_mode_button: Locator::xpath("//button[@aria-label='Edit users']"),
            quota_field: LocatorTemplate::xpath("//input[starts-with(@id, 'quota{name}')]"),
            save_edit: Locator::xpath("//button[@title='Done']"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareLocators {
    pub recipient_input: Locator,
    pub save_share: Locator,
    pub internal_link: Locator,
    pub create_external_link: Locator,
    pub external_link: Locator,
    /// Shown on the public page of an external link
    pub public_file_name: LocatorTemplate,
    /// Shown when an internal link is opened by an authorised user
    pub internal_share_header: LocatorTemplate,
}

impl Default for ShareLocators {
    fn default() -> Self {
        Self {
            recipient_input: Locator::xpath("//input[@id='sharing-search-input']"),
            save_share: Locator::xpath(
                "//button[@type='button']//span[contains(text(), 'Save share')]",
            ),
            internal_link: Locator::xpath("//a[@aria-label='Copy internal link to clipboard']"),
            create_external_link: Locator::xpath("//button[@aria-label='Create a new share link']"),
            external_link: Locator::xpath(
                "//a[contains(@class, 'sharing-entry__copy') and contains(@href, '/s/')]",
            ),
            public_file_name: LocatorTemplate::xpath("//span[contains(text(), '{name}')]"),
            internal_share_header: LocatorTemplate::xpath(
                "//div[contains(@class, 'modal-header')]//h2[contains(text(), '{name}')]",
            ),
        }
    }
}

/// All selectors used by the step functions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locators {
    pub auth: AuthLocators,
    pub files: FileLocators,
    pub users: UserLocators,
    pub sharing: ShareLocators,
}

impl Locators {
    /// Reject empty selectors, templates without a `{name}` slot and a
    /// non-id upload input.
    pub fn validate(&self) -> HarnessResult<()> {
        let mut problems = Vec::new();

        for (role, locator) in self.plain() {
            if locator.value.trim().is_empty() {
                problems.push(format!("{} is empty", role));
            }
        }
        for (role, template) in self.templates() {
            if !template.0.value.contains(NAME_PLACEHOLDER) {
                problems.push(format!("{} has no {} placeholder", role, NAME_PLACEHOLDER));
            }
        }
        if self.auth.page_loaded.is_empty() {
            problems.push("auth.page_loaded needs at least one marker".to_string());
        }
        if self.files.upload_input.by != By::Id {
            problems.push("files.upload_input must be an id locator".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::InvalidConfig(format!(
                "locators: {}",
                problems.join("; ")
            )))
        }
    }

    fn plain(&self) -> Vec<(String, &Locator)> {
        let a = &self.auth;
        let f = &self.files;
        let u = &self.users;
        let s = &self.sharing;
        let mut out: Vec<(String, &Locator)> = vec![
            ("auth.username_input".into(), &a.username_input),
            ("auth.password_input".into(), &a.password_input),
            ("auth.login_button".into(), &a.login_button),
            ("auth.welcome_modal_close".into(), &a.welcome_modal_close),
            ("auth.settings_menu_open".into(), &a.settings_menu_open),
            ("auth.settings_menu_closed".into(), &a.settings_menu_closed),
            ("auth.logout_link".into(), &a.logout_link),
            ("auth.header".into(), &a.header),
            ("files.files_tab".into(), &f.files_tab),
            ("files.files_container".into(), &f.files_container),
            ("files.app_content".into(), &f.app_content),
            ("files.upload_input".into(), &f.upload_input),
            ("files.list_rows".into(), &f.list_rows),
            ("files.delete_action".into(), &f.delete_action),
            ("users.users_link".into(), &u.users_link),
            ("users.user_list".into(), &u.user_list),
            ("users.new_user_button".into(), &u.new_user_button),
            ("users.username_input".into(), &u.username_input),
            ("users.display_name_input".into(), &u.display_name_input),
            ("users.password_input".into(), &u.password_input),
            ("users.email_input".into(), &u.email_input),
            ("users.group_dropdown".into(), &u.group_dropdown),
            ("users.quota_dropdown".into(), &u.quota_dropdown),
            ("users.quota_input".into(), &u.quota_input),
            ("users.manager_input".into(), &u.manager_input),
            ("users.submit".into(), &u.submit),
            ("users.delete_menu_item".into(), &u.delete_menu_item),
            ("users.confirm_delete".into(), &u.confirm_delete),
            ("users.edit_mode_button".into(), &u.edit_mode_button),
            ("users.save_edit".into(), &u.save_edit),
            ("sharing.recipient_input".into(), &s.recipient_input),
            ("sharing.save_share".into(), &s.save_share),
            ("sharing.internal_link".into(), &s.internal_link),
            ("sharing.create_external_link".into(), &s.create_external_link),
            ("sharing.external_link".into(), &s.external_link),
        ];
        for (i, marker) in a.page_loaded.iter().enumerate() {
            out.push((format!("auth.page_loaded[{}]", i), marker));
        }
        out
    }

    fn templates(&self) -> Vec<(&'static str, &LocatorTemplate)> {
        vec![
            ("files.row", &self.files.row),
            ("files.actions_menu", &self.files.actions_menu),
            ("files.download_action", &self.files.download_action),
            ("files.share_action", &self.files.share_action),
            ("users.group_option", &self.users.group_option),
            ("users.manager_option", &self.users.manager_option),
            ("users.row", &self.users.row),
            ("users.row_actions", &self.users.row_actions),
            ("users.quota_field", &self.users.quota_field),
            ("sharing.public_file_name", &self.sharing.public_file_name),
            ("sharing.internal_share_header", &self.sharing.internal_share_header),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Locators::default().validate().unwrap();
    }

    #[test]
    fn test_render_template() {
        let locators = Locators::default();
        let row = locators.files.row.render("test_medium_file_1.txt");
        assert_eq!(row.by, By::XPath);
        assert_eq!(row.value, "//tr[@data-file='test_medium_file_1.txt']");
        assert_eq!(row.to_string(), "xpath=//tr[@data-file='test_medium_file_1.txt']");
    }

    #[test]
    fn test_validate_rejects_bad_entries() {
        let mut locators = Locators::default();
        locators.auth.login_button.value = "  ".to_string();
        locators.users.row = LocatorTemplate::xpath("//div[@class='row']");
        locators.files.upload_input = Locator::css("#file_upload_start");

        let err = locators.validate().unwrap_err().to_string();
        assert!(err.contains("auth.login_button is empty"), "{err}");
        assert!(err.contains("users.row has no {name} placeholder"), "{err}");
        assert!(err.contains("files.upload_input must be an id locator"), "{err}");
    }

    #[test]
    fn test_partial_yaml_override_keeps_defaults() {
        let yaml = r#"
auth:
  login_button:
    by: css
    value: "button[type=submit]"
files:
  row:
    by: css
    value: "tr[data-file='{name}']"
"#;
        let locators: Locators = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(locators.auth.login_button, Locator::css("button[type=submit]"));
        assert_eq!(locators.auth.username_input, Locator::id("user"));
        assert_eq!(locators.files.row.render("a.txt"), Locator::css("tr[data-file='a.txt']"));
        assert_eq!(locators.users, UserLocators::default());
        locators.validate().unwrap();
    }
}
