//! Step outcomes and the step boundary

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{FailureKind, HarnessError, HarnessResult};

/// Result of a step: fully successful, or a failure with a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

impl ActionResult {
    pub fn ok(detail: impl Into<String>) -> Self {
        Self {
            success: true,
            detail: detail.into(),
            kind: None,
        }
    }

    pub fn failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
            kind: Some(kind),
        }
    }

    pub fn from_error(err: &HarnessError) -> Self {
        Self::failed(err.kind(), err.to_string())
    }
}

impl From<HarnessResult<String>> for ActionResult {
    fn from(result: HarnessResult<String>) -> Self {
        match result {
            Ok(detail) => ActionResult::ok(detail),
            Err(e) => ActionResult::from_error(&e),
        }
    }
}

/// Run a step body and contain whatever it produces: errors and panics
/// become a failed [`ActionResult`].
pub async fn contain<F>(step: &str, body: F) -> ActionResult
where
    F: Future<Output = HarnessResult<String>>,
{
    let outcome = match AssertUnwindSafe(body).catch_unwind().await {
        Ok(result) => ActionResult::from(result),
        Err(payload) => ActionResult::failed(
            FailureKind::Unexpected,
            format!("panic: {}", panic_message(payload.as_ref())),
        ),
    };

    if outcome.success {
        info!(step, "✓ {}", outcome.detail);
    } else {
        warn!(step, kind = ?outcome.kind, "✗ {}", outcome.detail);
    }
    outcome
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
