//! Error types for the syslog event engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TranslateError>;

/// Errors surfaced by message conversion and configuration loading.
///
/// A [`TranslateError::Discarded`] is the normal "no event for this
/// message" outcome: the caller is expected to log the reason and drop
/// the message without retrying. Pattern-compilation failures and
/// hostname-resolution failures are recovered inside the pipeline and
/// never reach this type.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// The message produced no event and carries a human-readable reason.
    #[error("message discarded: {0}")]
    Discarded(String),

    /// Configuration failed load-time validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed as YAML.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranslateError {
    /// True for the discard outcome, which yields no event but is not a
    /// failure of the worker.
    pub fn is_discard(&self) -> bool {
        matches!(self, TranslateError::Discarded(_))
    }
}
