//! Error types for report evaluation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing section in {report}: {section}")]
    MissingSection {
        report: &'static str,
        section: String,
    },

    #[error("Malformed {report}: {detail}")]
    Malformed {
        report: &'static str,
        detail: String,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
