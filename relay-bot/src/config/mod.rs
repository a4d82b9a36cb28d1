//! Relay configuration: the JSON config file (API credentials, manager token, worker bots,
//! file names) plus run-poll and admin settings.

mod relay_config;

#[cfg(test)]
mod tests;

pub use relay_config::{
    BotDescriptor, RelayConfig, RunPollConfig, DEFAULT_FAILURE_REPLY, DEFAULT_LOG_FILE_NAME,
    DEFAULT_THREADS_FILE_NAME,
};
