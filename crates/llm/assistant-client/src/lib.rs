//! # Assistant API client
//!
//! Drives the hosted assistant's asynchronous protocol (create thread, post message, start run,
//! poll run, fetch reply) over [reqwest] and returns plain text.
//! Provides token masking for safe logging and the [`Assistant`] seam used by bot workers.

mod client;
mod error;
mod poll;
mod wire;

pub use client::{AssistantClient, ConversationRun, RunInfo, DEFAULT_API_BASE};
pub use error::{AssistantError, Result};
pub use poll::{PollPolicy, RunStatus};

use async_trait::async_trait;

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

/// What a bot worker needs from the assistant service. [`AssistantClient`] is the HTTP implementation.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Creates a new conversation thread and returns its id.
    async fn create_thread(&self) -> Result<String>;

    /// Posts `text` to `thread_id`, runs `assistant_id` over the thread and returns the reply text.
    async fn handle_message(&self, text: &str, thread_id: &str, assistant_id: &str)
        -> Result<String>;
}

#[async_trait]
impl Assistant for AssistantClient {
    async fn create_thread(&self) -> Result<String> {
        AssistantClient::create_thread(self).await
    }

    async fn handle_message(
        &self,
        text: &str,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<String> {
        AssistantClient::handle_message(self, text, thread_id, assistant_id).await
    }
}
