//! Long-poll update source: getUpdates with a moving offset, converted to core messages.

use async_trait::async_trait;
use relay_core::{Message, RelayError, Result, ToCoreMessage, UpdateSource};
use teloxide::payloads::GetUpdatesSetters;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, UpdateKind};
use tracing::{debug, instrument};

use super::adapters::TelegramMessageWrapper;

/// Pulls message updates for one bot. Each call to `next_batch` acknowledges the previous batch.
pub struct TelegramUpdateSource {
    bot: teloxide::Bot,
    offset: i32,
    timeout_secs: u32,
}

impl TelegramUpdateSource {
    pub fn new(bot: teloxide::Bot, timeout_secs: u32) -> Self {
        Self {
            bot,
            offset: 0,
            timeout_secs,
        }
    }
}

#[async_trait]
impl UpdateSource for TelegramUpdateSource {
    #[instrument(skip(self), fields(offset = self.offset))]
    async fn next_batch(&mut self) -> Result<Option<Vec<Message>>> {
        let updates = self
            .bot
            .get_updates()
            .offset(self.offset)
            .timeout(self.timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .await
            .map_err(|e| RelayError::Bot(format!("getUpdates failed: {}", e)))?;

        let mut batch = Vec::with_capacity(updates.len());
        for update in updates {
            self.offset = self.offset.max(update.id.0 as i32 + 1);
            if let UpdateKind::Message(msg) = update.kind {
                batch.push(TelegramMessageWrapper(&msg).to_core());
            }
        }
        debug!(count = batch.len(), next_offset = self.offset, "Updates received");
        Ok(Some(batch))
    }
}
