//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{HarnessError, HarnessResult};
use crate::locator::Locators;
use crate::wait::WaitPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// URL of the file-sync instance under test
    pub target_url: String,

    /// Administrator account driving the journey
    pub admin: Credentials,

    /// Root for generated fixtures and downloads
    pub base_dir: PathBuf,

    /// Name of the cookie that proves an authenticated session
    pub session_cookie: String,

    pub files: FileConfig,

    pub new_user: NewUserConfig,

    pub timeouts: TimeoutConfig,

    pub locators: Locators,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            target_url: "http://127.0.0.1:8080".to_string(),
            admin: Credentials::default(),
            base_dir: PathBuf::from("test-data"),
            session_cookie: "oc_sessionPassphrase".to_string(),
            files: FileConfig::default(),
            new_user: NewUserConfig::default(),
            timeouts: TimeoutConfig::default(),
            locators: Locators::default(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("admin", "")
    }
}

pub const REDACTED: &str = "<redacted>";

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &REDACTED)
            .finish()
    }
}

/// Generated test files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub medium_size_mb: u64,
    pub large_size_mb: u64,
    pub medium_base_name: String,
    pub large_base_name: String,
    pub extension: String,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            medium_size_mb: 1,
            large_size_mb: 1,
            medium_base_name: "test_medium_file".to_string(),
            large_base_name: "test_large_file".to_string(),
            extension: ".txt".to_string(),
        }
    }
}

/// Attributes of the user created by the journey
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUserConfig {
    pub group: String,
    pub quota: String,
    pub manager: String,
    /// Quota applied by the modify-quota step
    pub modified_quota: String,
}

impl Default for NewUserConfig {
    fn default() -> Self {
        Self {
            group: "admin".to_string(),
            quota: "1 GB".to_string(),
            manager: "admin".to_string(),
            modified_quota: "2 GB".to_string(),
        }
    }
}

/// Wait bounds, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Locating any element
    pub element_ms: u64,
    /// Polling interval for element waits
    pub interval_ms: u64,
    /// Optional elements such as the welcome modal
    pub probe_ms: u64,
    /// Checking whether the session is already on a page before navigating
    pub page_probe_ms: u64,
    /// Session cookie after submitting credentials
    pub login_ms: u64,
    /// Rows that appear after a server round trip
    pub presence_ms: u64,
    /// Uploaded file appearing in the list
    pub upload_ms: u64,
    /// Downloaded file landing on disk
    pub download_ms: u64,
    pub download_interval_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            element_ms: 10_000,
            interval_ms: 500,
            probe_ms: 5_000,
            page_probe_ms: 1_000,
            login_ms: 30_000,
            presence_ms: 30_000,
            upload_ms: 120_000,
            download_ms: 500_000,
            download_interval_ms: 5_000,
        }
    }
}

impl TimeoutConfig {
    /// Shrink or stretch every bound; intervals never drop below 10ms.
    pub fn scaled(&self, factor: f64) -> Self {
        let scale = |ms: u64| ((ms as f64) * factor).round() as u64;
        Self {
            element_ms: scale(self.element_ms),
            interval_ms: scale(self.interval_ms).max(10),
            probe_ms: scale(self.probe_ms),
            page_probe_ms: scale(self.page_probe_ms),
            login_ms: scale(self.login_ms),
            presence_ms: scale(self.presence_ms),
            upload_ms: scale(self.upload_ms),
            download_ms: scale(self.download_ms),
            download_interval_ms: scale(self.download_interval_ms).max(10),
        }
    }

    pub fn element(&self) -> WaitPolicy {
        WaitPolicy::new(ms(self.element_ms), ms(self.interval_ms))
    }

    pub fn probe(&self) -> Duration {
        ms(self.probe_ms)
    }

    pub fn page_probe(&self) -> Duration {
        ms(self.page_probe_ms)
    }

    pub fn login(&self) -> WaitPolicy {
        self.element().with_timeout(ms(self.login_ms))
    }

    pub fn presence(&self) -> WaitPolicy {
        self.element().with_timeout(ms(self.presence_ms))
    }

    pub fn upload(&self) -> WaitPolicy {
        self.element().with_timeout(ms(self.upload_ms))
    }

    pub fn download(&self) -> WaitPolicy {
        WaitPolicy::new(ms(self.download_ms), ms(self.download_interval_ms))
    }

    /// Names of the wait bounds that are zero
    pub fn zero_bounds(&self) -> Vec<&'static str> {
        [
            ("element_ms", self.element_ms),
            ("probe_ms", self.probe_ms),
            ("page_probe_ms", self.page_probe_ms),
            ("login_ms", self.login_ms),
            ("presence_ms", self.presence_ms),
            ("upload_ms", self.upload_ms),
            ("download_ms", self.download_ms),
        ]
        .into_iter()
        .filter(|(_, value)| *value == 0)
        .map(|(name, _)| name)
        .collect()
    }
}

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

impl HarnessConfig {
    /// Parse a config from YAML; omitted fields keep their defaults.
    pub fn from_yaml(yaml: &str) -> HarnessResult<Self> {
        serde_yaml::from_str(yaml).map_err(HarnessError::from)
    }

    pub fn from_file(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn to_yaml(&self) -> HarnessResult<String> {
        serde_yaml::to_string(self).map_err(HarnessError::from)
    }

    /// Copy safe to print: the admin password is masked.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if !shown.admin.password.is_empty() {
            shown.admin.password = REDACTED.to_string();
        }
        shown
    }

    /// Where generated fixtures are written before upload
    pub fn created_files_dir(&self) -> PathBuf {
        self.base_dir.join("created_files")
    }

    /// Where the browser drops downloads
    pub fn download_dir(&self) -> PathBuf {
        self.base_dir.join("downloads")
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.target_url.trim_end_matches('/')
    }

    pub fn validate(&self) -> HarnessResult<()> {
        if !(self.target_url.starts_with("http://") || self.target_url.starts_with("https://")) {
            return Err(HarnessError::InvalidConfig(format!(
                "target_url must be an http(s) URL, got '{}'",
                self.target_url
            )));
        }
        if self.admin.username.is_empty() {
            return Err(HarnessError::InvalidConfig("admin.username is empty".into()));
        }
        if self.session_cookie.is_empty() {
            return Err(HarnessError::InvalidConfig("session_cookie is empty".into()));
        }
        if self.files.medium_size_mb == 0 || self.files.large_size_mb == 0 {
            return Err(HarnessError::InvalidConfig(
                "file sizes must be at least 1 MB".into(),
            ));
        }
        if self.timeouts.interval_ms == 0 || self.timeouts.download_interval_ms == 0 {
            return Err(HarnessError::InvalidConfig(
                "polling intervals must be non-zero".into(),
            ));
        }
        let zero = self.timeouts.zero_bounds();
        if !zero.is_empty() {
            return Err(HarnessError::InvalidConfig(format!(
                "timeouts must be non-zero: {}",
                zero.join(", ")
            )));
        }
        self.locators.validate()
    }
}
