//! Action primitives
//!
//! Each primitive performs one remote interaction behind a bounded wait.
//! Locating never mutates remote state, so every lookup can be retried by
//! the wait policy.

use std::time::Duration;

use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::locator::Locator;
use crate::session::{ElementRef, Session};
use crate::wait::WaitPolicy;

/// Scripts understood by any page
pub mod scripts {
    pub const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView({block: 'center'});";
    pub const DOCUMENT_READY: &str = "return document.readyState";
    pub const SCROLL_TO_BOTTOM: &str =
        "arguments[0].scrollTop = arguments[0].scrollHeight; return arguments[0].scrollHeight;";

    /// Remove the class that hides the upload input with the given id
    pub fn reveal_upload_input(id: &str) -> String {
        format!(
            "document.getElementById(\"{}\").classList.remove(\"hiddenuploadfield\");",
            id
        )
    }
}

pub struct Actions<'a, S: Session + ?Sized> {
    session: &'a S,
    policy: WaitPolicy,
}

impl<'a, S: Session + ?Sized> Actions<'a, S> {
    pub fn new(session: &'a S, policy: WaitPolicy) -> Self {
        Self { session, policy }
    }

    pub fn session(&self) -> &'a S {
        self.session
    }

    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// Same session, different bound.
    pub fn within(&self, timeout: Duration) -> Actions<'a, S> {
        Actions {
            session: self.session,
            policy: self.policy.with_timeout(timeout),
        }
    }

    /// Wait for the element to be attached.
    pub async fn locate(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let session = self.session;
        self.policy
            .until(&format!("presence of {}", locator), move || async move {
                session.find(locator).await.map(Some)
            })
            .await
            .map_err(|e| not_found(locator, e))
    }

    /// Wait for the element to be attached and displayed.
    pub async fn locate_visible(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let session = self.session;
        self.policy
            .until(&format!("visibility of {}", locator), move || async move {
                let element = session.find(locator).await?;
                Ok(session.is_displayed(element).await?.then_some(element))
            })
            .await
            .map_err(|e| not_found(locator, e))
    }

    /// Wait for the element to be displayed and enabled.
    pub async fn locate_clickable(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let session = self.session;
        self.policy
            .until(&format!("clickable {}", locator), move || async move {
                let element = session.find(locator).await?;
                let ready =
                    session.is_displayed(element).await? && session.is_enabled(element).await?;
                Ok(ready.then_some(element))
            })
            .await
            .map_err(|e| not_found(locator, e))
    }

    /// Cheap presence check bounded by `within`; never an error.
    pub async fn is_present(&self, locator: &Locator, within: Duration) -> bool {
        let session = self.session;
        self.policy
            .with_timeout(within)
            .probe(&format!("presence of {}", locator), move || async move {
                session.find(locator).await.map(Some)
            })
            .await
            .is_some()
    }

    /// Wait until nothing displayed matches the locator.
    pub async fn wait_absent(&self, locator: &Locator) -> HarnessResult<()> {
        let session = self.session;
        self.policy
            .until(&format!("invisibility of {}", locator), move || async move {
                let elements = session.find_all(locator).await?;
                for element in elements {
                    match session.is_displayed(element).await {
                        Ok(true) => return Ok(None),
                        Ok(false) | Err(HarnessError::StaleElement(_)) => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(Some(()))
            })
            .await
    }

    /// Wait until a previously located element is detached from the page.
    pub async fn wait_stale(&self, element: ElementRef) -> HarnessResult<()> {
        let session = self.session;
        self.policy
            .until(&format!("staleness of element {}", element.0), move || async move {
                match session.is_displayed(element).await {
                    Err(HarnessError::StaleElement(_)) => Ok(Some(())),
                    Ok(_) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
    }

    pub async fn wait_document_ready(&self) -> HarnessResult<()> {
        let session = self.session;
        self.policy
            .until("document ready", move || async move {
                let state = session.execute_script(scripts::DOCUMENT_READY, &[]).await?;
                Ok((state.as_str() == Some("complete")).then_some(()))
            })
            .await
    }

    pub async fn scroll_into_view(&self, element: ElementRef) -> HarnessResult<()> {
        self.session
            .execute_script(scripts::SCROLL_INTO_VIEW, &[element])
            .await?;
        Ok(())
    }

    /// Locate, scroll into view and click.
    pub async fn click(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let element = self.locate_clickable(locator).await?;
        self.scroll_into_view(element).await?;
        debug!(%locator, "click");
        self.session.click(element).await?;
        Ok(element)
    }

    /// Locate, focus and type.
    pub async fn type_into(&self, locator: &Locator, text: &str) -> HarnessResult<ElementRef> {
        let element = self.locate_clickable(locator).await?;
        debug!(%locator, chars = text.chars().count(), "type");
        self.session.send_keys(element, text).await?;
        Ok(element)
    }

    /// Clear then type.
    pub async fn replace_text(&self, locator: &Locator, text: &str) -> HarnessResult<ElementRef> {
        let element = self.locate_visible(locator).await?;
        self.scroll_into_view(element).await?;
        self.session.clear(element).await?;
        self.session.send_keys(element, text).await?;
        Ok(element)
    }

    /// Wait for the element and one of its attributes to be present.
    pub async fn read_attribute(&self, locator: &Locator, name: &str) -> HarnessResult<String> {
        let session = self.session;
        self.policy
            .until(&format!("attribute {} of {}", name, locator), move || async move {
                let element = session.find(locator).await?;
                session.attribute(element, name).await
            })
            .await
            .map_err(|e| not_found(locator, e))
    }
}

fn not_found(locator: &Locator, err: HarnessError) -> HarnessError {
    match err {
        HarnessError::Timeout { what, elapsed_ms } => HarnessError::NotFound(format!(
            "{} (gave up after {} ms waiting for {})",
            locator, elapsed_ms, what
        )),
        other => other,
    }
}
