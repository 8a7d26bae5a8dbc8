//! Error types for the revision-core crate.

use thiserror::Error;

/// Top-level error type for schedule construction, configuration and runs.
///
/// Computing a threshold never fails; these variants only surface at the
/// configuration, driver and I/O boundaries.
#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Trainer error: {0}")]
    Trainer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Configuration source error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl RevisionError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn history(msg: impl Into<String>) -> Self {
        Self::History(msg.into())
    }

    pub fn trainer(msg: impl Into<String>) -> Self {
        Self::Trainer(msg.into())
    }
}
