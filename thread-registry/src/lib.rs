//! Thread registry crate: maps (bot, user) pairs to assistant conversation threads.
//!
//! ## Modules
//!
//! - [`error`] – Registry error types
//! - [`registry`] – ThreadRegistry, the shared in-memory map
//! - [`snapshot`] – On-disk JSON snapshot format

mod error;
mod registry;
mod snapshot;


pub use error::{RegistryError, Result};
pub use registry::{ThreadKey, ThreadRegistry};
pub use snapshot::{BotBucket, Snapshot};
