//! In-memory file-sync web app
//!
//! [`SimServer`] holds the server side: accounts, groups, stored files and
//! shares. Each [`SimSession`] is one browser window on it with its own
//! page, cookie and element handles, and implements [`Session`].
//!
//! Pages are rendered from the configured [`Locators`], so a lookup only
//! succeeds when the harness asks for exactly the selector the UI would
//! expose. Element handles go stale on navigation, on refresh and when the
//! element disappears from the page.
//!
//! Faults can be injected server-wide to rehearse failure attribution.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, trace};

use crate::actions::scripts;
use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::locator::{Locator, Locators};
use crate::session::{Cookie, ElementRef, Session, KEY_ENTER};

/// Rows rendered per lazy-load round of the file list
pub const PAGE_SIZE: usize = 20;

const ROW_HEIGHT_PX: usize = 50;

struct Site {
    base_url: String,
    session_cookie: String,
    download_dir: PathBuf,
    locators: Locators,
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    display_name: String,
    email: String,
    groups: Vec<String>,
    quota: String,
    manager: Option<String>,
}

impl Account {
    fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            display_name: String::new(),
            email: String::new(),
            groups: Vec::new(),
            quota: "default".to_string(),
            manager: None,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredFile {
    id: u64,
    owner: String,
    name: String,
    content: Vec<u8>,
    shared_with: BTreeSet<String>,
    public_token: Option<String>,
}

impl StoredFile {
    fn visible_to(&self, user: &str) -> bool {
        self.owner == user || self.shared_with.contains(user)
    }
}

#[derive(Default)]
struct Faults {
    fail_on: HashMap<Locator, String>,
    panic_on: HashSet<Locator>,
    defer: HashMap<Locator, u32>,
    corrupt_downloads: bool,
    refuse_user_deletion: bool,
    open_internal_links: bool,
}

#[derive(Default)]
struct ServerState {
    accounts: BTreeMap<String, Account>,
    groups: BTreeSet<String>,
    files: Vec<StoredFile>,
    welcomed: HashSet<String>,
    faults: Faults,
    next_file_id: u64,
}

impl ServerState {
    fn visible_files(&self, user: &str) -> Vec<&StoredFile> {
        let mut files: Vec<&StoredFile> =
            self.files.iter().filter(|f| f.visible_to(user)).collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));
        files
    }

    fn file_for(&self, user: &str, name: &str) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.name == name && f.visible_to(user))
    }

    fn file_for_mut(&mut self, user: &str, name: &str) -> Option<&mut StoredFile> {
        self.files.iter_mut().find(|f| f.name == name && f.visible_to(user))
    }
}

/// Shared simulated server
#[derive(Clone)]
pub struct SimServer {
    site: Arc<Site>,
    state: Arc<Mutex<ServerState>>,
}

impl SimServer {
    /// Seed the administrator account and the configured group.
    pub fn new(config: &HarnessConfig) -> Self {
        let mut state = ServerState {
            next_file_id: 1,
            ..Default::default()
        };
        let mut admin = Account::new(&config.admin.password);
        admin.display_name = config.admin.username.clone();
        admin.groups.push("admin".to_string());
        state.accounts.insert(config.admin.username.clone(), admin);
        state.groups.insert("admin".to_string());
        state.groups.insert(config.new_user.group.clone());

        Self {
            site: Arc::new(Site {
                base_url: config.base_url().to_string(),
                session_cookie: config.session_cookie.clone(),
                download_dir: config.download_dir(),
                locators: config.locators.clone(),
            }),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A fresh browser window with no cookies.
    pub fn open_session(&self) -> SimSession {
        SimSession {
            site: Arc::clone(&self.site),
            server: Arc::clone(&self.state),
            browser: Arc::new(Mutex::new(BrowserState::default())),
        }
    }

    pub fn add_account(&self, username: &str, password: &str) {
        self.state
            .lock()
            .accounts
            .insert(username.to_string(), Account::new(password));
    }

    pub fn has_account(&self, username: &str) -> bool {
        self.state.lock().accounts.contains_key(username)
    }

    pub fn account_quota(&self, username: &str) -> Option<String> {
        self.state.lock().accounts.get(username).map(|a| a.quota.clone())
    }

    pub fn account_manager(&self, username: &str) -> Option<String> {
        self.state
            .lock()
            .accounts
            .get(username)
            .and_then(|a| a.manager.clone())
    }

    /// Names of files owned by `owner`, sorted.
    pub fn file_names(&self, owner: &str) -> Vec<String> {
        let state = self.state.lock();
        let mut names: Vec<String> = state
            .files
            .iter()
            .filter(|f| f.owner == owner)
            .map(|f| f.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Store a file directly, bypassing the upload UI.
    pub fn put_file(&self, owner: &str, name: &str, content: &[u8]) {
        let mut state = self.state.lock();
        store_file(&mut state, owner, name, content.to_vec());
    }

    /// Interacting with any element matching `locator` fails with `message`.
    pub fn fail_on(&self, locator: Locator, message: impl Into<String>) {
        self.state.lock().faults.fail_on.insert(locator, message.into());
    }

    /// Interacting with any element matching `locator` panics.
    pub fn panic_on(&self, locator: Locator) {
        self.state.lock().faults.panic_on.insert(locator);
    }

    /// The next `polls` lookups of `locator` come back empty.
    pub fn defer(&self, locator: Locator, polls: u32) {
        self.state.lock().faults.defer.insert(locator, polls);
    }

    /// Downloads arrive with their first byte flipped.
    pub fn corrupt_downloads(&self, enabled: bool) {
        self.state.lock().faults.corrupt_downloads = enabled;
    }

    /// Confirming a user deletion silently does nothing.
    pub fn refuse_user_deletion(&self, enabled: bool) {
        self.state.lock().faults.refuse_user_deletion = enabled;
    }

    /// Internal file links open without authentication.
    pub fn open_internal_links(&self, enabled: bool) {
        self.state.lock().faults.open_internal_links = enabled;
    }
}

fn store_file(state: &mut ServerState, owner: &str, name: &str, content: Vec<u8>) {
    if let Some(existing) = state
        .files
        .iter_mut()
        .find(|f| f.owner == owner && f.name == name)
    {
        existing.content = content;
        return;
    }
    let id = state.next_file_id;
    state.next_file_id += 1;
    state.files.push(StoredFile {
        id,
        owner: owner.to_string(),
        name: name.to_string(),
        content,
        shared_with: BTreeSet::new(),
        public_token: None,
    });
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Page {
    Blank,
    Login { redirect: Option<String> },
    Dashboard,
    Files,
    Users,
    PublicShare { token: String },
    InternalShare { file_id: u64 },
}

impl Page {
    fn signed_in_only(&self) -> bool {
        matches!(
            self,
            Page::Dashboard | Page::Files | Page::Users | Page::InternalShare { .. }
        )
    }
}

#[derive(Debug, Default)]
struct NewUserForm {
    group: Option<String>,
    group_open: bool,
    quota: Option<String>,
    manager: Option<String>,
}

#[derive(Debug)]
struct BrowserState {
    page: Page,
    user: Option<String>,
    cookie: Option<String>,
    generation: u64,
    inputs: HashMap<String, String>,
    settings_open: bool,
    welcome_open: bool,
    upload_revealed: bool,
    loaded_rows: usize,
    file_menu: Option<String>,
    share_panel: Option<String>,
    new_user: Option<NewUserForm>,
    user_menu: Option<String>,
    pending_user_delete: Option<String>,
    edit_mode: bool,
    handles: HashMap<u64, (String, u64)>,
    next_handle: u64,
    journal: Vec<String>,
    closed: bool,
}

impl Default for BrowserState {
    fn default() -> Self {
        Self {
            page: Page::Blank,
            user: None,
            cookie: None,
            generation: 0,
            inputs: HashMap::new(),
            settings_open: false,
            welcome_open: false,
            upload_revealed: false,
            loaded_rows: PAGE_SIZE,
            file_menu: None,
            share_panel: None,
            new_user: None,
            user_menu: None,
            pending_user_delete: None,
            edit_mode: false,
            handles: HashMap::new(),
            next_handle: 1,
            journal: Vec::new(),
            closed: false,
        }
    }
}

impl BrowserState {
    fn input(&self, key: &str) -> String {
        self.inputs.get(key).cloned().unwrap_or_default()
    }

    fn signed_in(&self) -> Option<&str> {
        match (&self.user, &self.cookie) {
            (Some(user), Some(_)) => Some(user.as_str()),
            _ => None,
        }
    }

    /// Drop page-local UI state.
    fn reset_ui(&mut self) {
        self.inputs.clear();
        self.settings_open = false;
        self.upload_revealed = false;
        self.loaded_rows = PAGE_SIZE;
        self.file_menu = None;
        self.share_panel = None;
        self.new_user = None;
        self.user_menu = None;
        self.pending_user_delete = None;
        self.edit_mode = false;
    }

    /// Full page load: every handle goes stale.
    fn reload(&mut self) {
        self.reset_ui();
        self.generation += 1;
    }

    fn record(&mut self, entry: String) {
        trace!(%entry, "sim mutation");
        self.journal.push(entry);
    }

    fn handle_for(&mut self, key: &str) -> ElementRef {
        let generation = self.generation;
        if let Some((&id, _)) = self
            .handles
            .iter()
            .find(|(_, (k, g))| k == key && *g == generation)
        {
            return ElementRef(id);
        }
        let id = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(id, (key.to_string(), generation));
        ElementRef(id)
    }
}

#[derive(Debug, Clone)]
struct Node {
    key: String,
    locators: Vec<Locator>,
    displayed: bool,
    enabled: bool,
    attrs: Vec<(&'static str, String)>,
}

impl Node {
    fn new(key: impl Into<String>, locator: &Locator) -> Self {
        Self {
            key: key.into(),
            locators: vec![locator.clone()],
            displayed: true,
            enabled: true,
            attrs: Vec::new(),
        }
    }

    fn also(mut self, locator: &Locator) -> Self {
        self.locators.push(locator.clone());
        self
    }

    fn displayed(mut self, displayed: bool) -> Self {
        self.displayed = displayed;
        self
    }

    fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        self.locators.iter().any(|l| l == locator)
    }

    fn entity(&self) -> Option<&str> {
        self.key.split_once('/').map(|(_, name)| name)
    }

    fn role(&self) -> &str {
        self.key.split_once('/').map(|(role, _)| role).unwrap_or(&self.key)
    }
}

fn render(site: &Site, b: &BrowserState, s: &ServerState) -> Vec<Node> {
    let l = &site.locators;
    let mut nodes = Vec::new();

    match &b.page {
        Page::Blank => {}
        Page::Login { .. } => {
            if let Some(marker) = l.auth.page_loaded.first() {
                nodes.push(Node::new("auth.marker.login", marker));
            }
            nodes.push(
                Node::new("auth.username", &l.auth.username_input)
                    .attr("value", b.input("auth.username")),
            );
            nodes.push(Node::new("auth.password", &l.auth.password_input));
            nodes.push(Node::new("auth.login", &l.auth.login_button));
        }
        Page::PublicShare { token } => {
            if let Some(file) = s
                .files
                .iter()
                .find(|f| f.public_token.as_deref() == Some(token.as_str()))
            {
                nodes.push(Node::new(
                    format!("share.public/{}", file.name),
                    &l.sharing.public_file_name.render(&file.name),
                ));
            }
        }
        _ => {}
    }

    let Some(user) = b.signed_in() else {
        return nodes;
    };
    if !b.page.signed_in_only() {
        return nodes;
    }

    render_chrome(l, b, &mut nodes);
    match &b.page {
        Page::Dashboard => {
            if let Some(marker) = l.auth.page_loaded.last() {
                nodes.push(Node::new("auth.marker.dashboard", marker));
            }
        }
        Page::Files => render_files(site, b, s, user, &mut nodes),
        Page::Users => render_users(l, b, s, &mut nodes),
        Page::InternalShare { file_id } => {
            if let Some(file) = s.files.iter().find(|f| f.id == *file_id) {
                nodes.push(Node::new(
                    format!("share.header/{}", file.name),
                    &l.sharing.internal_share_header.render(&file.name),
                ));
            }
        }
        _ => {}
    }
    nodes
}

fn render_chrome(l: &Locators, b: &BrowserState, nodes: &mut Vec<Node>) {
    nodes.push(Node::new("auth.header", &l.auth.header));
    if b.settings_open {
        nodes.push(Node::new("auth.settings", &l.auth.settings_menu_open));
        nodes.push(Node::new("auth.logout", &l.auth.logout_link));
    } else {
        nodes.push(Node::new("auth.settings", &l.auth.settings_menu_closed));
    }
    nodes.push(Node::new("files.tab", &l.files.files_tab));
    nodes.push(Node::new("users.link", &l.users.users_link));
    if b.welcome_open {
        nodes.push(Node::new("auth.welcome", &l.auth.welcome_modal_close));
    }
}

fn render_files(site: &Site, b: &BrowserState, s: &ServerState, user: &str, nodes: &mut Vec<Node>) {
    let f = &site.locators.files;
    nodes.push(Node::new("files.container", &f.files_container));
    nodes.push(Node::new("files.content", &f.app_content));
    nodes.push(Node::new("files.upload", &f.upload_input).displayed(b.upload_revealed));

    for file in s.visible_files(user).into_iter().take(b.loaded_rows) {
        let name = &file.name;
        nodes.push(
            Node::new(format!("files.row/{}", name), &f.list_rows)
                .also(&f.row.render(name))
                .attr("data-file", name.clone())
                .attr("data-id", file.id.to_string()),
        );
        nodes.push(Node::new(format!("files.menu/{}", name), &f.actions_menu.render(name)));
        nodes.push(Node::new(format!("files.share/{}", name), &f.share_action.render(name)));
        if b.file_menu.as_deref() == Some(name.as_str()) {
            nodes.push(Node::new(
                format!("files.download/{}", name),
                &f.download_action.render(name),
            ));
            nodes.push(Node::new(format!("files.delete/{}", name), &f.delete_action));
        }
    }

    let Some(shared) = b.share_panel.as_deref() else {
        return;
    };
    let Some(file) = s.file_for(user, shared) else {
        return;
    };
    let sh = &site.locators.sharing;
    let recipient = b.input("share.recipient");
    nodes.push(Node::new("share.recipient", &sh.recipient_input).attr("value", recipient.clone()));
    nodes.push(Node::new("share.save", &sh.save_share).enabled(!recipient.trim().is_empty()));
    nodes.push(
        Node::new("share.internal", &sh.internal_link)
            .attr("href", format!("{}/f/{}", site.base_url, file.id)),
    );
    match &file.public_token {
        None => nodes.push(Node::new("share.create_external", &sh.create_external_link)),
        Some(token) => nodes.push(
            Node::new("share.external", &sh.external_link)
                .attr("href", format!("{}/s/{}", site.base_url, token)),
        ),
    }
}

fn render_users(l: &Locators, b: &BrowserState, s: &ServerState, nodes: &mut Vec<Node>) {
    let u = &l.users;
    nodes.push(Node::new("users.list", &u.user_list));
    nodes.push(Node::new("users.new", &u.new_user_button));
    nodes.push(Node::new("users.edit_mode", &u.edit_mode_button));

    for (username, account) in &s.accounts {
        nodes.push(
            Node::new(format!("users.row/{}", username), &u.row.render(username))
                .attr("data-id", username.clone())
                .attr("data-quota", account.quota.clone())
                .attr("data-display-name", account.display_name.clone())
                .attr("data-email", account.email.clone())
                .attr("data-groups", account.groups.join(",")),
        );
        nodes.push(Node::new(
            format!("users.actions/{}", username),
            &u.row_actions.render(username),
        ));
        if b.edit_mode {
            let key = format!("users.quota/{}", username);
            let value = b.inputs.get(&key).cloned().unwrap_or_else(|| account.quota.clone());
            nodes.push(Node::new(key, &u.quota_field.render(username)).attr("value", value));
        }
    }
    if b.user_menu.is_some() {
        nodes.push(Node::new("users.delete_item", &u.delete_menu_item));
    }
    if b.pending_user_delete.is_some() {
        nodes.push(Node::new("users.confirm", &u.confirm_delete));
    }
    if b.edit_mode {
        nodes.push(Node::new("users.save_edit", &u.save_edit));
    }

    let Some(form) = &b.new_user else {
        return;
    };
    nodes.push(Node::new("users.new.username", &u.username_input));
    nodes.push(Node::new("users.new.display_name", &u.display_name_input));
    nodes.push(Node::new("users.new.password", &u.password_input));
    nodes.push(Node::new("users.new.email", &u.email_input));
    nodes.push(Node::new("users.group_dropdown", &u.group_dropdown));
    if form.group_open {
        for group in &s.groups {
            nodes.push(Node::new(format!("users.group/{}", group), &u.group_option.render(group)));
        }
    }
    nodes.push(Node::new("users.quota_dropdown", &u.quota_dropdown));
    nodes.push(Node::new("users.quota_input", &u.quota_input));
    let typed_manager = b.input("users.manager_input");
    nodes.push(
        Node::new("users.manager_input", &u.manager_input).attr("value", typed_manager.clone()),
    );
    if !typed_manager.is_empty() {
        for username in s.accounts.keys().filter(|name| name.contains(typed_manager.as_str())) {
            nodes.push(Node::new(
                format!("users.manager/{}", username),
                &u.manager_option.render(username),
            ));
        }
    }
    nodes.push(Node::new("users.submit", &u.submit));
}

/// One browser window on a [`SimServer`]. Clones share the same window.
#[derive(Clone)]
pub struct SimSession {
    site: Arc<Site>,
    server: Arc<Mutex<ServerState>>,
    browser: Arc<Mutex<BrowserState>>,
}

impl SimSession {
    /// Every state-changing call made on this window, in order.
    pub fn journal(&self) -> Vec<String> {
        self.browser.lock().journal.clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.browser.lock().journal.len()
    }

    pub fn is_closed(&self) -> bool {
        self.browser.lock().closed
    }

    pub fn signed_in_user(&self) -> Option<String> {
        self.browser.lock().signed_in().map(str::to_string)
    }

    fn open(&self, b: &BrowserState) -> HarnessResult<()> {
        if b.closed {
            Err(HarnessError::Session("session is closed".into()))
        } else {
            Ok(())
        }
    }

    fn route(&self, b: &BrowserState, s: &ServerState, target: &str) -> Page {
        let path = match target.strip_prefix(self.site.base_url.as_str()) {
            Some(rest) => rest,
            None if target.starts_with('/') => target,
            None => return Page::Blank,
        };
        let (path, query) = path.split_once('?').unwrap_or((path, ""));
        let path = path.trim_end_matches('/');
        let user = b.signed_in();
        let login = |redirect: &str| Page::Login {
            redirect: Some(redirect.to_string()),
        };

        match path {
            "" | "/index.php" => match user {
                Some(_) => Page::Dashboard,
                None => Page::Login { redirect: None },
            },
            "/login" => match user {
                Some(_) => Page::Dashboard,
                None => Page::Login {
                    redirect: query
                        .strip_prefix("redirect_url=")
                        .map(str::to_string),
                },
            },
            "/apps/dashboard" => match user {
                Some(_) => Page::Dashboard,
                None => login(path),
            },
            p if p.starts_with("/apps/files") => match user {
                Some(_) => Page::Files,
                None => login(path),
            },
            "/settings/users" => match user {
                Some(_) => Page::Users,
                None => login(path),
            },
            p if p.starts_with("/s/") => {
                let token = &p[3..];
                if s.files.iter().any(|f| f.public_token.as_deref() == Some(token)) {
                    Page::PublicShare {
                        token: token.to_string(),
                    }
                } else {
                    Page::Blank
                }
            }
            p if p.starts_with("/f/") => {
                let Ok(id) = p[3..].parse::<u64>() else {
                    return Page::Blank;
                };
                let Some(file) = s.files.iter().find(|f| f.id == id) else {
                    return Page::Blank;
                };
                match user {
                    Some(u) if file.visible_to(u) => Page::InternalShare { file_id: id },
                    Some(_) => Page::Files,
                    None if s.faults.open_internal_links => Page::InternalShare { file_id: id },
                    None => login(path),
                }
            }
            _ => Page::Blank,
        }
    }

    fn url_of(&self, page: &Page) -> String {
        let base = &self.site.base_url;
        match page {
            Page::Blank => "about:blank".to_string(),
            Page::Login { redirect: None } => format!("{}/login", base),
            Page::Login { redirect: Some(r) } => format!("{}/login?redirect_url={}", base, r),
            Page::Dashboard => format!("{}/apps/dashboard/", base),
            Page::Files => format!("{}/apps/files/", base),
            Page::Users => format!("{}/settings/users", base),
            Page::PublicShare { token } => format!("{}/s/{}", base, token),
            Page::InternalShare { file_id } => format!("{}/f/{}", base, file_id),
        }
    }

    fn resolve(
        &self,
        b: &BrowserState,
        s: &ServerState,
        element: ElementRef,
    ) -> HarnessResult<Node> {
        let (key, generation) = b
            .handles
            .get(&element.0)
            .ok_or_else(|| HarnessError::StaleElement(format!("unknown element {}", element.0)))?;
        if *generation != b.generation {
            return Err(HarnessError::StaleElement(key.clone()));
        }
        render(&self.site, b, s)
            .into_iter()
            .find(|n| &n.key == key)
            .ok_or_else(|| HarnessError::StaleElement(key.clone()))
    }

    /// Consume one deferral for `locator`, if any.
    fn deferred(s: &mut ServerState, locator: &Locator) -> bool {
        match s.faults.defer.get_mut(locator) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    /// Resolve a handle for interaction, applying modal and fault rules.
    /// Returns the node or the locator to panic on.
    fn interactable(
        &self,
        b: &BrowserState,
        s: &ServerState,
        element: ElementRef,
    ) -> HarnessResult<Result<Node, Locator>> {
        let node = self.resolve(b, s, element)?;
        if let Some(locator) = node.locators.iter().find(|l| s.faults.panic_on.contains(l)) {
            return Ok(Err(locator.clone()));
        }
        if let Some(message) = node.locators.iter().find_map(|l| s.faults.fail_on.get(l)) {
            return Err(HarnessError::Session(message.clone()));
        }
        if b.welcome_open && node.key != "auth.welcome" {
            return Err(HarnessError::NotInteractable(format!(
                "{} is covered by the welcome modal",
                node.key
            )));
        }
        if !node.displayed {
            return Err(HarnessError::NotInteractable(format!("{} is hidden", node.key)));
        }
        Ok(Ok(node))
    }

    fn sign_in(&self, b: &mut BrowserState, s: &mut ServerState, username: &str) {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        b.user = Some(username.to_string());
        b.cookie = Some(token);
        b.welcome_open = s.welcomed.insert(username.to_string());

        let redirect = match &b.page {
            Page::Login { redirect } => redirect.clone(),
            _ => None,
        };
        let page = match redirect {
            Some(target) => self.route(b, s, &target),
            None => Page::Dashboard,
        };
        b.page = page;
        b.reload();
        debug!(user = username, "sim sign-in");
    }

    fn sign_out(&self, b: &mut BrowserState) {
        b.user = None;
        b.cookie = None;
        b.welcome_open = false;
        b.page = Page::Login { redirect: None };
        b.reload();
    }

    fn click_node(
        &self,
        b: &mut BrowserState,
        s: &mut ServerState,
        node: &Node,
    ) -> HarnessResult<()> {
        let user = b.signed_in().map(str::to_string);
        let entity = node.entity().map(str::to_string);

        match node.role() {
            "auth.login" => {
                let username = b.input("auth.username");
                let password = b.input("auth.password");
                let accepted = s
                    .accounts
                    .get(&username)
                    .map(|a| a.password == password)
                    .unwrap_or(false);
                if accepted {
                    self.sign_in(b, s, &username);
                } else {
                    debug!(user = %username, "sim rejected credentials");
                    b.inputs.remove("auth.password");
                }
            }
            "auth.welcome" => b.welcome_open = false,
            "auth.settings" => b.settings_open = !b.settings_open,
            "auth.logout" => self.sign_out(b),
            "files.tab" => {
                b.page = Page::Files;
                b.reset_ui();
            }
            "users.link" => {
                b.page = Page::Users;
                b.reset_ui();
            }
            "files.menu" => {
                b.file_menu = if b.file_menu == entity { None } else { entity };
            }
            "files.download" => {
                let (Some(user), Some(name)) = (user, entity) else {
                    return Ok(());
                };
                if let Some(file) = s.file_for(&user, &name) {
                    let mut content = file.content.clone();
                    if s.faults.corrupt_downloads {
                        match content.first_mut() {
                            Some(byte) => *byte ^= 0xFF,
                            None => content.push(0),
                        }
                    }
                    write_download(&self.site.download_dir, &name, &content)?;
                }
                b.file_menu = None;
            }
            "files.delete" => {
                if let (Some(user), Some(name)) = (user, entity) {
                    s.files.retain(|f| !(f.name == name && f.owner == user));
                }
                b.file_menu = None;
            }
            "files.share" => {
                b.share_panel = entity;
                b.inputs.remove("share.recipient");
            }
            "share.save" => {
                let recipient = b.input("share.recipient").trim().to_string();
                let (Some(user), Some(name)) = (user, b.share_panel.clone()) else {
                    return Ok(());
                };
                if s.accounts.contains_key(&recipient) {
                    if let Some(file) = s.file_for_mut(&user, &name) {
                        file.shared_with.insert(recipient);
                    }
                }
                b.inputs.remove("share.recipient");
            }
            "share.create_external" => {
                let (Some(user), Some(name)) = (user, b.share_panel.clone()) else {
                    return Ok(());
                };
                if let Some(file) = s.file_for_mut(&user, &name) {
                    let token: String = rand::thread_rng()
                        .sample_iter(&Alphanumeric)
                        .take(15)
                        .map(char::from)
                        .collect();
                    file.public_token = Some(token);
                }
            }
            "users.new" => b.new_user = Some(NewUserForm::default()),
            "users.group_dropdown" => {
                if let Some(form) = b.new_user.as_mut() {
                    form.group_open = !form.group_open;
                }
            }
            "users.group" => {
                if let Some(form) = b.new_user.as_mut() {
                    form.group = entity;
                    form.group_open = false;
                }
            }
            "users.manager" => {
                if let Some(form) = b.new_user.as_mut() {
                    form.manager = entity;
                }
            }
            "users.submit" => self.submit_new_user(b, s),
            "users.actions" => b.user_menu = entity,
            "users.delete_item" => b.pending_user_delete = b.user_menu.take(),
            "users.confirm" => {
                if let Some(username) = b.pending_user_delete.take() {
                    if !s.faults.refuse_user_deletion {
                        s.accounts.remove(&username);
                        s.files.retain(|f| f.owner != username);
                        for file in s.files.iter_mut() {
                            file.shared_with.remove(&username);
                        }
                    }
                }
            }
            "users.edit_mode" => b.edit_mode = true,
            "users.save_edit" => b.edit_mode = false,
            _ => {}
        }
        Ok(())
    }

    fn submit_new_user(&self, b: &mut BrowserState, s: &mut ServerState) {
        let Some(form) = b.new_user.take() else {
            return;
        };
        let username = b.input("users.new.username");
        if username.is_empty() || s.accounts.contains_key(&username) {
            debug!(user = %username, "sim rejected new user");
            b.new_user = Some(form);
            return;
        }

        let mut account = Account::new(&b.input("users.new.password"));
        account.display_name = b.input("users.new.display_name");
        account.email = b.input("users.new.email");
        account.groups = form.group.into_iter().collect();
        if let Some(quota) = form.quota {
            account.quota = quota;
        }
        account.manager = form.manager;
        s.accounts.insert(username.clone(), account);

        for key in [
            "users.new.username",
            "users.new.display_name",
            "users.new.password",
            "users.new.email",
            "users.quota_input",
            "users.manager_input",
        ] {
            b.inputs.remove(key);
        }
        debug!(user = %username, "sim created user");
    }

    fn type_into_node(
        &self,
        b: &mut BrowserState,
        s: &mut ServerState,
        node: &Node,
        text: &str,
    ) -> HarnessResult<()> {
        match node.role() {
            "files.upload" => {
                let Some(user) = b.signed_in().map(str::to_string) else {
                    return Err(HarnessError::Session("upload requires a signed-in user".into()));
                };
                let path = Path::new(text);
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .ok_or_else(|| HarnessError::Session(format!("not a file: {}", text)))?;
                let content = std::fs::read(path)?;
                debug!(file = %name, bytes = content.len(), "sim upload");
                store_file(s, &user, &name, content);
            }
            "users.quota_input" => {
                let value = b.input(&node.key) + text;
                match value.split_once(KEY_ENTER) {
                    Some((quota, _)) => {
                        if let Some(form) = b.new_user.as_mut() {
                            form.quota = Some(quota.trim().to_string());
                        }
                        b.inputs.remove(&node.key);
                    }
                    None => {
                        b.inputs.insert(node.key.clone(), value);
                    }
                }
            }
            "users.quota" => {
                let value = b.input(&node.key) + text;
                match (value.split_once(KEY_ENTER), node.entity()) {
                    (Some((quota, _)), Some(username)) => {
                        if let Some(account) = s.accounts.get_mut(username) {
                            account.quota = quota.trim().to_string();
                        }
                        b.inputs.insert(node.key.clone(), quota.to_string());
                    }
                    _ => {
                        b.inputs.insert(node.key.clone(), value);
                    }
                }
            }
            _ => {
                let value = b.input(&node.key) + text;
                b.inputs.insert(node.key.clone(), value);
            }
        }
        Ok(())
    }
}

fn write_download(dir: &Path, name: &str, content: &[u8]) -> HarnessResult<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(name), content)?;
    debug!(file = name, bytes = content.len(), "sim download written");
    Ok(())
}

#[async_trait]
impl Session for SimSession {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();
        b.record(format!("navigate {}", url));
        let page = self.route(&b, &s, url);
        b.page = page;
        b.reload();
        Ok(())
    }

    async fn refresh(&self) -> HarnessResult<()> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();
        b.record("refresh".to_string());
        let url = self.url_of(&b.page);
        if b.page.signed_in_only() || matches!(b.page, Page::PublicShare { .. }) {
            let page = self.route(&b, &s, &url);
            b.page = page;
        }
        b.reload();
        Ok(())
    }

    async fn current_url(&self) -> HarnessResult<String> {
        let b = self.browser.lock();
        self.open(&b)?;
        Ok(self.url_of(&b.page))
    }

    async fn find(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        let mut s = self.server.lock();
        if Self::deferred(&mut s, locator) {
            return Err(HarnessError::NotFound(locator.to_string()));
        }
        let key = render(&self.site, &b, &s)
            .into_iter()
            .find(|n| n.matches(locator))
            .map(|n| n.key)
            .ok_or_else(|| HarnessError::NotFound(locator.to_string()))?;
        Ok(b.handle_for(&key))
    }

    async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementRef>> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        let mut s = self.server.lock();
        if Self::deferred(&mut s, locator) {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = render(&self.site, &b, &s)
            .into_iter()
            .filter(|n| n.matches(locator))
            .map(|n| n.key)
            .collect();
        Ok(keys.iter().map(|k| b.handle_for(k)).collect())
    }

    async fn click(&self, element: ElementRef) -> HarnessResult<()> {
        let panic_locator = {
            let mut b = self.browser.lock();
            self.open(&b)?;
            let mut s = self.server.lock();
            match self.interactable(&b, &s, element)? {
                Ok(node) => {
                    if !node.enabled {
                        return Err(HarnessError::NotInteractable(format!(
                            "{} is disabled",
                            node.key
                        )));
                    }
                    b.record(format!("click {}", node.key));
                    self.click_node(&mut b, &mut s, &node)?;
                    None
                }
                Err(locator) => Some(locator),
            }
        };
        if let Some(locator) = panic_locator {
            panic!("simulated crash while clicking {}", locator);
        }
        Ok(())
    }

    async fn send_keys(&self, element: ElementRef, text: &str) -> HarnessResult<()> {
        let panic_locator = {
            let mut b = self.browser.lock();
            self.open(&b)?;
            let mut s = self.server.lock();
            match self.interactable(&b, &s, element)? {
                Ok(node) => {
                    b.record(format!("send_keys {}", node.key));
                    self.type_into_node(&mut b, &mut s, &node, text)?;
                    None
                }
                Err(locator) => Some(locator),
            }
        };
        if let Some(locator) = panic_locator {
            panic!("simulated crash while typing into {}", locator);
        }
        Ok(())
    }

    async fn clear(&self, element: ElementRef) -> HarnessResult<()> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();
        let node = self.resolve(&b, &s, element)?;
        if let Some(message) = node.locators.iter().find_map(|l| s.faults.fail_on.get(l)) {
            return Err(HarnessError::Session(message.clone()));
        }
        b.record(format!("clear {}", node.key));
        b.inputs.insert(node.key, String::new());
        Ok(())
    }

    async fn attribute(&self, element: ElementRef, name: &str) -> HarnessResult<Option<String>> {
        let b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();
        let node = self.resolve(&b, &s, element)?;
        let from_input = (name == "value").then(|| b.inputs.get(&node.key).cloned()).flatten();
        Ok(from_input.or_else(|| {
            node.attrs
                .iter()
                .find(|(attr, _)| *attr == name)
                .map(|(_, value)| value.clone())
        }))
    }

    async fn is_displayed(&self, element: ElementRef) -> HarnessResult<bool> {
        let b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();
        Ok(self.resolve(&b, &s, element)?.displayed)
    }

    async fn is_enabled(&self, element: ElementRef) -> HarnessResult<bool> {
        let b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();
        Ok(self.resolve(&b, &s, element)?.enabled)
    }

    async fn cookies(&self) -> HarnessResult<Vec<Cookie>> {
        let b = self.browser.lock();
        self.open(&b)?;
        Ok(b.cookie
            .iter()
            .map(|value| Cookie {
                name: self.site.session_cookie.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn delete_cookies(&self) -> HarnessResult<()> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        b.record("delete_cookies".to_string());
        b.cookie = None;
        b.user = None;
        b.welcome_open = false;
        Ok(())
    }

    async fn execute_script(
        &self,
        script: &str,
        args: &[ElementRef],
    ) -> HarnessResult<serde_json::Value> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        let s = self.server.lock();

        if script == scripts::DOCUMENT_READY {
            return Ok(serde_json::Value::from("complete"));
        }
        if script == scripts::SCROLL_INTO_VIEW {
            let element = args
                .first()
                .ok_or_else(|| HarnessError::Session("scrollIntoView needs an element".into()))?;
            self.resolve(&b, &s, *element)?;
            return Ok(serde_json::Value::Null);
        }
        if script == scripts::SCROLL_TO_BOTTOM {
            let element = args
                .first()
                .ok_or_else(|| HarnessError::Session("scroll needs a container".into()))?;
            self.resolve(&b, &s, *element)?;
            b.record("script scroll-to-bottom".to_string());
            b.loaded_rows += PAGE_SIZE;
            let shown = match b.signed_in() {
                Some(user) => s.visible_files(user).len().min(b.loaded_rows),
                None => 0,
            };
            return Ok(serde_json::Value::from(shown * ROW_HEIGHT_PX));
        }
        if script == scripts::reveal_upload_input(&self.site.locators.files.upload_input.value) {
            b.record("script reveal-upload".to_string());
            if b.page == Page::Files {
                b.upload_revealed = true;
            }
            return Ok(serde_json::Value::Null);
        }
        Err(HarnessError::Session(format!("unsupported script: {}", script)))
    }

    async fn quit(&self) -> HarnessResult<()> {
        let mut b = self.browser.lock();
        self.open(&b)?;
        b.record("quit".to_string());
        b.closed = true;
        b.handles.clear();
        Ok(())
    }
}
