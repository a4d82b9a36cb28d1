//! Bot abstractions for receiving updates and sending messages.
//!
//! [`Bot`], [`UpdateSource`] and [`BotConnector`] are transport-agnostic; `relay-telegram`
//! implements them via teloxide, tests substitute in-memory mocks.

use crate::error::Result;
use crate::types::{Chat, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Abstraction for sending messages. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()>;

    /// Sends a reply to the given message (same chat).
    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        self.send_message(&message.chat, text).await
    }
}

/// Long-poll style source of inbound messages for one bot.
#[async_trait]
pub trait UpdateSource: Send {
    /// Waits for the next batch of inbound messages.
    ///
    /// `Ok(None)` means the source is closed and will not produce more updates.
    /// An empty batch is a poll timeout; callers simply ask again.
    async fn next_batch(&mut self) -> Result<Option<Vec<Message>>>;
}

/// A bot that passed token validation: its account name plus send/receive halves.
pub struct ConnectedBot {
    /// Account username reported by the transport (used as the registry's bot key).
    pub name: String,
    pub bot: Arc<dyn Bot>,
    pub updates: Box<dyn UpdateSource>,
}

impl std::fmt::Debug for ConnectedBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedBot")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Turns a bot token into a [`ConnectedBot`], validating the token on the way.
#[async_trait]
pub trait BotConnector: Send + Sync {
    async fn connect(&self, token: &str) -> Result<ConnectedBot>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelayError;
    use std::sync::Mutex;

    struct RecordingBot {
        sent: Mutex<Vec<(i64, String)>>,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
            if text.is_empty() {
                return Err(RelayError::Bot("empty text".to_string()));
            }
            self.sent.lock().unwrap().push((chat.id, text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reply_to_sends_to_message_chat() {
        let bot = RecordingBot {
            sent: Mutex::new(Vec::new()),
        };
        let msg = Message::text("7", 42, "hello");

        bot.reply_to(&msg, "hi there").await.unwrap();
        assert!(bot.reply_to(&msg, "").await.is_err());

        let sent = bot.sent.lock().unwrap();
        assert_eq!(sent.as_slice(), &[(42, "hi there".to_string())]);
    }
}
