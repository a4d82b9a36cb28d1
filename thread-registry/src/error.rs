//! Registry error types.
//!
//! Raised by snapshot import/export; in-memory operations cannot fail.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or writing a registry snapshot.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Snapshot IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Snapshot at {path} is not valid JSON: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
