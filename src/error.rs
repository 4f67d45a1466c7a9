//! Error handling module for the dropins step
//!
//! Provides centralized error types using thiserror. Expected per-dropin
//! failures are not errors: they end up in the step's error narrative. These
//! types cover the collaborator failures that abort a run.

use thiserror::Error;

/// Main error type for the dropins step
#[derive(Error, Debug)]
pub enum DropinError {
    /// IO errors (file copies, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Locale list fetch errors
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Single dropin transfer errors
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// Confirmation prompt errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for dropin operations
pub type Result<T> = std::result::Result<T, DropinError>;

impl DropinError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a fetch error
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Create a transfer error
    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    /// Create a prompt error
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::Prompt(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }
}
