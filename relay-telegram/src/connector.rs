//! Token → running bot: builds the teloxide client, validates the token via getMe.

use async_trait::async_trait;
use relay_core::{BotConnector, ConnectedBot, RelayError, Result};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;

use super::bot_adapter::TelegramBotAdapter;
use super::config::TelegramConfig;
use super::poller::TelegramUpdateSource;

/// Connects Telegram bots with shared settings.
#[derive(Debug, Clone, Default)]
pub struct TelegramConnector {
    config: TelegramConfig,
}

impl TelegramConnector {
    pub fn new(config: TelegramConfig) -> Self {
        Self { config }
    }

    /// Builds a teloxide Bot whose HTTP timeout outlasts the long-poll wait.
    fn build_bot(&self, token: &str) -> Result<teloxide::Bot> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(self.config.http_timeout())
            .build()
            .map_err(|e| RelayError::Bot(format!("failed to build HTTP client: {}", e)))?;
        let bot = teloxide::Bot::with_client(token, client);
        Ok(match &self.config.api_url {
            Some(url) => bot.set_api_url(url.clone()),
            None => bot,
        })
    }
}

#[async_trait]
impl BotConnector for TelegramConnector {
    async fn connect(&self, token: &str) -> Result<ConnectedBot> {
        let bot = self.build_bot(token)?;
        let me = bot
            .get_me()
            .await
            .map_err(|e| RelayError::Bot(format!("getMe failed: {}", e)))?;
        let name = me
            .user
            .username
            .clone()
            .unwrap_or_else(|| me.user.id.to_string());
        info!(bot = %name, "Authorized bot account");

        Ok(ConnectedBot {
            name,
            bot: Arc::new(TelegramBotAdapter::new(bot.clone())),
            updates: Box::new(TelegramUpdateSource::new(bot, self.config.poll_timeout_secs)),
        })
    }
}
