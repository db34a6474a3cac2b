//! The remote session seam
//!
//! Step functions only talk to the application under test through this
//! trait. A WebDriver client, a CDP bridge or the in-memory
//! [`crate::sim::SimServer`] can stand behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HarnessResult;
use crate::locator::Locator;

/// WebDriver key code for Enter
pub const KEY_ENTER: &str = "\u{E007}";

/// Opaque element handle, valid until the element is detached or the page
/// is reloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

/// Capability set of a remote interactive context.
///
/// `find` returns [`crate::HarnessError::NotFound`] when nothing matches and
/// never waits; polling is the caller's job. Operations on a detached handle
/// return [`crate::HarnessError::StaleElement`].
#[async_trait]
pub trait Session: Send + Sync {
    async fn navigate(&self, url: &str) -> HarnessResult<()>;

    async fn refresh(&self) -> HarnessResult<()>;

    async fn current_url(&self) -> HarnessResult<String>;

    async fn find(&self, locator: &Locator) -> HarnessResult<ElementRef>;

    async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementRef>>;

    async fn click(&self, element: ElementRef) -> HarnessResult<()>;

    async fn send_keys(&self, element: ElementRef, text: &str) -> HarnessResult<()>;

    async fn clear(&self, element: ElementRef) -> HarnessResult<()>;

    async fn attribute(&self, element: ElementRef, name: &str) -> HarnessResult<Option<String>>;

    async fn is_displayed(&self, element: ElementRef) -> HarnessResult<bool>;

    async fn is_enabled(&self, element: ElementRef) -> HarnessResult<bool>;

    async fn cookies(&self) -> HarnessResult<Vec<Cookie>>;

    async fn delete_cookies(&self) -> HarnessResult<()>;

    /// Run a script in the page; `args` are exposed as `arguments[i]`.
    async fn execute_script(
        &self,
        script: &str,
        args: &[ElementRef],
    ) -> HarnessResult<serde_json::Value>;

    /// Close the session. Further calls fail.
    async fn quit(&self) -> HarnessResult<()>;
}
