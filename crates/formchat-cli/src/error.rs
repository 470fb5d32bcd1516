//! Error types for the formchat command-line host.

use thiserror::Error;

/// Errors raised while loading configuration or touching local storage.
#[derive(Debug, Error)]
pub enum CliError {
    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] formchat::StoreError),

    /// Invalid conversation ID format.
    #[error("Invalid conversation ID: {0}")]
    InvalidConversationId(String),
}

/// Result type alias using `CliError`.
pub type Result<T> = std::result::Result<T, CliError>;
