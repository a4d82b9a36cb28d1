//! Relay config file: loaded at startup and on `/reload`, optionally written back on `/add`.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assistant_client::{mask_token, PollPolicy, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_THREADS_FILE_NAME: &str = "threads.json";
pub const DEFAULT_LOG_FILE_NAME: &str = "log.txt";
pub const DEFAULT_FAILURE_REPLY: &str = "Sorry, I couldn't process your message. Please try again.";

/// A worker bot: display name and Bot API token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotDescriptor {
    pub name: String,
    pub token: String,
}

impl BotDescriptor {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for BotDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotDescriptor")
            .field("name", &self.name)
            .field("token", &mask_token(&self.token))
            .finish()
    }
}

/// Backoff settings for waiting on assistant runs (`runPoll`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunPollConfig {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RunPollConfig {
    fn default() -> Self {
        let policy = PollPolicy::default();
        Self {
            initial_interval_ms: policy.initial_interval.as_millis() as u64,
            max_interval_ms: policy.max_interval.as_millis() as u64,
            timeout_secs: policy.timeout.as_secs(),
        }
    }
}

impl RunPollConfig {
    pub fn to_policy(self) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_millis(self.initial_interval_ms),
            max_interval: Duration::from_millis(self.max_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Live relay configuration.
///
/// Keys are camelCase on disk (`apiKey`, `assistantID`, `managerBotToken`, `botTokens`,
/// `threadsFileName`, ...); everything except the three credentials has a default.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    pub api_key: String,
    #[serde(rename = "assistantID")]
    pub assistant_id: String,
    pub manager_bot_token: String,
    #[serde(default)]
    pub bot_tokens: Vec<BotDescriptor>,
    #[serde(default = "default_threads_file_name")]
    pub threads_file_name: String,
    #[serde(default = "default_log_file_name")]
    pub log_file_name: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Chats allowed to run `/reload` and `/add`; empty means everyone.
    #[serde(default)]
    pub admin_chat_ids: Vec<i64>,
    /// Sent to the user when a message cannot be answered; empty stays silent.
    #[serde(default = "default_failure_reply")]
    pub failure_reply: String,
    #[serde(default)]
    pub run_poll: RunPollConfig,
    /// Write the config back to disk after `/add`.
    #[serde(default)]
    pub persist_added_bots: bool,
}

fn default_threads_file_name() -> String {
    DEFAULT_THREADS_FILE_NAME.to_string()
}

fn default_log_file_name() -> String {
    DEFAULT_LOG_FILE_NAME.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_failure_reply() -> String {
    DEFAULT_FAILURE_REPLY.to_string()
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_key", &mask_token(&self.api_key))
            .field("assistant_id", &self.assistant_id)
            .field("manager_bot_token", &mask_token(&self.manager_bot_token))
            .field("bot_tokens", &self.bot_tokens)
            .field("threads_file_name", &self.threads_file_name)
            .field("log_file_name", &self.log_file_name)
            .field("api_base_url", &self.api_base_url)
            .field("admin_chat_ids", &self.admin_chat_ids)
            .field("failure_reply", &self.failure_reply)
            .field("run_poll", &self.run_poll)
            .field("persist_added_bots", &self.persist_added_bots)
            .finish()
    }
}

impl RelayConfig {
    /// Minimal config with every optional field at its default.
    pub fn new(
        api_key: impl Into<String>,
        assistant_id: impl Into<String>,
        manager_bot_token: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            assistant_id: assistant_id.into(),
            manager_bot_token: manager_bot_token.into(),
            bot_tokens: Vec::new(),
            threads_file_name: default_threads_file_name(),
            log_file_name: default_log_file_name(),
            api_base_url: default_api_base_url(),
            admin_chat_ids: Vec::new(),
            failure_reply: default_failure_reply(),
            run_poll: RunPollConfig::default(),
            persist_added_bots: false,
        }
    }

    /// Reads, parses and validates the config at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty-printed JSON.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut json = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        json.push('\n');
        std::fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("apiKey", &self.api_key),
            ("assistantID", &self.assistant_id),
            ("managerBotToken", &self.manager_bot_token),
            ("threadsFileName", &self.threads_file_name),
            ("logFileName", &self.log_file_name),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", key)));
            }
        }

        let mut names = HashSet::new();
        for bot in &self.bot_tokens {
            if bot.name.trim().is_empty() || bot.token.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "every botTokens entry needs a name and a token".to_string(),
                ));
            }
            if !names.insert(bot.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate bot name in botTokens: {}",
                    bot.name
                )));
            }
        }

        if reqwest::Url::parse(&self.api_base_url).is_err() {
            return Err(ConfigError::Invalid(format!(
                "apiBaseUrl is not a valid URL: {}",
                self.api_base_url
            )));
        }

        let poll = &self.run_poll;
        if poll.initial_interval_ms == 0 || poll.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "runPoll intervals and timeout must be positive".to_string(),
            ));
        }
        if poll.max_interval_ms < poll.initial_interval_ms {
            return Err(ConfigError::Invalid(
                "runPoll.maxIntervalMs must be >= runPoll.initialIntervalMs".to_string(),
            ));
        }
        Ok(())
    }

    /// Failure reply, or `None` when configured to stay silent.
    pub fn failure_reply(&self) -> Option<String> {
        if self.failure_reply.is_empty() {
            None
        } else {
            Some(self.failure_reply.clone())
        }
    }

    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_chat_ids.is_empty() || self.admin_chat_ids.contains(&chat_id)
    }

    pub fn bot(&self, name: &str) -> Option<&BotDescriptor> {
        self.bot_tokens.iter().find(|b| b.name == name)
    }

    pub fn threads_path(&self) -> PathBuf {
        PathBuf::from(&self.threads_file_name)
    }

    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(&self.log_file_name)
    }
}
