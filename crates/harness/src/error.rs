//! Error types for scenario execution

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Timed out after {elapsed_ms} ms waiting for {what}")]
    Timeout { what: String, elapsed_ms: u64 },

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Element not interactable: {0}")]
    NotInteractable(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Failure taxonomy reported at step and scenario level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expected UI element absent within its timeout
    NotFound,
    /// A required wait exceeded its bound
    Timeout,
    /// The action completed but its post-condition did not hold
    Verification,
    /// Anything else, including driver errors and panics
    Unexpected,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::NotFound => "not_found",
            FailureKind::Timeout => "timeout",
            FailureKind::Verification => "verification",
            FailureKind::Unexpected => "unexpected",
        };
        f.write_str(s)
    }
}

impl HarnessError {
    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::NotFound(_) => FailureKind::NotFound,
            HarnessError::Timeout { .. } => FailureKind::Timeout,
            HarnessError::Verification(_) => FailureKind::Verification,
            _ => FailureKind::Unexpected,
        }
    }

    /// Turn a required-wait timeout into a post-condition failure.
    pub fn into_verification(self, expectation: &str) -> Self {
        match self {
            HarnessError::Timeout { elapsed_ms, .. } => HarnessError::Verification(format!(
                "{} (not observed within {} ms)",
                expectation, elapsed_ms
            )),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(HarnessError::NotFound("x".into()).kind(), FailureKind::NotFound);
        assert_eq!(
            HarnessError::Timeout { what: "x".into(), elapsed_ms: 5 }.kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            HarnessError::Verification("x".into()).kind(),
            FailureKind::Verification
        );
        assert_eq!(HarnessError::Session("boom".into()).kind(), FailureKind::Unexpected);
        assert_eq!(
            HarnessError::StaleElement("row".into()).kind(),
            FailureKind::Unexpected
        );
    }

    #[test]
    fn test_timeout_becomes_verification() {
        let err = HarnessError::Timeout { what: "row".into(), elapsed_ms: 1500 }
            .into_verification("user row still visible");
        assert_eq!(err.kind(), FailureKind::Verification);
        assert!(err.to_string().contains("user row still visible"));
        assert!(err.to_string().contains("1500 ms"));

        let untouched = HarnessError::Session("gone".into()).into_verification("ignored");
        assert_eq!(untouched.kind(), FailureKind::Unexpected);
    }
}
