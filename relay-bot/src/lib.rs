//! Relay application: a manager bot plus one worker per configured bot, each relaying chat
//! messages to a hosted assistant over a shared thread registry.

pub mod cli;
pub mod config;
pub mod error;
pub mod fleet;
pub mod log_sink;
pub mod manager;
pub mod runner;
pub mod update_loop;
pub mod worker;

pub use config::{BotDescriptor, RelayConfig, RunPollConfig};
pub use error::{ConfigError, WorkerError};
pub use fleet::{BotFleet, StartOutcome};
pub use log_sink::{LogHandle, LogSink};
pub use manager::Manager;
pub use runner::{run, Relay};
pub use worker::{Worker, WorkerSettings};
