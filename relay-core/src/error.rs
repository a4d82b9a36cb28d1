//! Error types for the relay core.
//!
//! [`RelayError`] covers chat transport, configuration and authorization failures.

use thiserror::Error;

/// Top-level error for transport-facing operations.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Bot error: {0}")]
    Bot(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unauthorized: chat {0}")]
    Unauthorized(i64),
}

/// Result type for core operations; uses [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;
