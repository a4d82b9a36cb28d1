//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const DEFAULT_CONFIG_PATH: &str = "./config.json";
pub const DEFAULT_LOG_FILE: &str = "logs/relay.log";

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Relay chat bots to a hosted assistant", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the manager bot and every configured worker bot until Ctrl-C.
    Run {
        #[arg(short, long, env = "RELAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
        /// Diagnostic log file (the conversation log is `logFileName` in the config).
        #[arg(long, env = "RELAY_LOG_FILE", default_value = DEFAULT_LOG_FILE)]
        log_file: String,
    },
    /// Load and validate the config, then print the configured bots.
    Check {
        #[arg(short, long, env = "RELAY_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },
}
