//! Error types for the relay application.
//!
//! [`ConfigError`] is fatal at startup and reported back on `/reload`; [`WorkerError`] aborts one
//! message and is logged.

use std::path::PathBuf;

use assistant_client::AssistantError;
use relay_core::RelayError;
use thiserror::Error;

/// Config file could not be read, parsed, validated or written.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("cannot write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure while processing one inbound message.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("assistant: {0}")]
    Assistant(#[from] AssistantError),

    #[error("transport: {0}")]
    Transport(#[from] RelayError),
}
