//! Telegram connection settings shared by every bot the relay runs.

use relay_core::{RelayError, Result};
use std::time::Duration;

/// Seconds a getUpdates call waits by default.
pub const DEFAULT_POLL_TIMEOUT_SECS: u32 = 60;

/// Telegram connection settings: optional API URL override and long-poll timeout.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot API base URL (TELEGRAM_API_URL / TELOXIDE_API_URL); None uses api.telegram.org.
    pub api_url: Option<reqwest::Url>,
    /// Seconds a getUpdates call may wait for new updates.
    pub poll_timeout_secs: u32,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }
}

impl TelegramConfig {
    /// Reads TELEGRAM_API_URL (or TELOXIDE_API_URL); an unparsable URL is an error.
    pub fn from_env() -> Result<Self> {
        let api_url = match std::env::var("TELEGRAM_API_URL")
            .or_else(|_| std::env::var("TELOXIDE_API_URL"))
        {
            Ok(raw) => Some(reqwest::Url::parse(&raw).map_err(|e| {
                RelayError::Config(format!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}: {}",
                    raw, e
                ))
            })?),
            Err(_) => None,
        };
        Ok(Self {
            api_url,
            ..Self::default()
        })
    }

    /// HTTP timeout for Bot API calls: the long-poll wait plus headroom.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.poll_timeout_secs) + 15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelegramConfig::default();
        assert!(config.api_url.is_none());
        assert_eq!(config.poll_timeout_secs, 60);
        assert_eq!(config.http_timeout(), Duration::from_secs(75));
    }
}
