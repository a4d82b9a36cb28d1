//! Bot worker: relays one bot's inbound messages to the assistant and sends the replies back.
//!
//! Per update: resolve (or create and persist) the user's thread, run the assistant over it,
//! log both sides of the exchange and reply in the originating chat.

use std::path::PathBuf;
use std::sync::Arc;

use assistant_client::Assistant;
use async_trait::async_trait;
use relay_core::{Bot, Message, UpdateSource};
use thread_registry::ThreadRegistry;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::RelayConfig;
use crate::error::WorkerError;
use crate::log_sink::LogHandle;
use crate::update_loop::{run_update_loop, UpdateHandler};

/// Settings a worker reads for every message; replaced in place on `/reload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    pub assistant_id: String,
    pub snapshot_path: PathBuf,
    /// `None` keeps failures silent.
    pub failure_reply: Option<String>,
}

impl WorkerSettings {
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            assistant_id: config.assistant_id.clone(),
            snapshot_path: config.threads_path(),
            failure_reply: config.failure_reply(),
        }
    }
}

pub type SharedSettings = Arc<RwLock<WorkerSettings>>;

pub struct Worker {
    name: String,
    bot: Arc<dyn Bot>,
    assistant: Arc<dyn Assistant>,
    registry: ThreadRegistry,
    settings: SharedSettings,
    log: LogHandle,
}

impl Worker {
    pub fn new(
        name: impl Into<String>,
        bot: Arc<dyn Bot>,
        assistant: Arc<dyn Assistant>,
        registry: ThreadRegistry,
        settings: SharedSettings,
        log: LogHandle,
    ) -> Self {
        Self {
            name: name.into(),
            bot,
            assistant,
            registry,
            settings,
            log,
        }
    }

    /// Handles one inbound message.
    ///
    /// Returns `Ok(Some(reply))` once the reply was sent, `Ok(None)` for messages without text,
    /// and the processing error otherwise (after logging it and sending the failure reply).
    #[instrument(skip(self, message), fields(bot = %self.name, user_id = message.user.id))]
    pub async fn handle_message(&self, message: &Message) -> Result<Option<String>, WorkerError> {
        if message.content.trim().is_empty() {
            debug!("Ignoring message without text");
            return Ok(None);
        }

        let user = message.user_key();
        info!(message_content = %message.content, "Received message");
        self.log.log(format!("{}:{}", user, message.content)).await;

        let settings = self.settings.read().await.clone();
        let reply = match self.ask(message, &user, &settings).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Failed to get assistant reply");
                if let Some(text) = &settings.failure_reply {
                    if let Err(send_err) = self.bot.reply_to(message, text).await {
                        warn!(error = %send_err, "Failed to send failure reply");
                    }
                }
                return Err(e);
            }
        };

        self.log.log(reply.clone()).await;
        if let Err(e) = self.bot.reply_to(message, &reply).await {
            error!(error = %e, "Failed to send reply");
            return Err(e.into());
        }
        info!(reply_len = reply.len(), "Reply sent");
        Ok(Some(reply))
    }

    async fn ask(
        &self,
        message: &Message,
        user: &str,
        settings: &WorkerSettings,
    ) -> Result<String, WorkerError> {
        let thread_id = self.resolve_thread(user, settings).await?;
        let reply = self
            .assistant
            .handle_message(&message.content, &thread_id, &settings.assistant_id)
            .await?;
        Ok(reply)
    }

    /// Existing thread for `user`, or a new one saved to the registry and snapshot.
    async fn resolve_thread(
        &self,
        user: &str,
        settings: &WorkerSettings,
    ) -> Result<String, WorkerError> {
        if let Some(thread_id) = self.registry.get_thread(&self.name, user).await {
            if !thread_id.is_empty() {
                return Ok(thread_id);
            }
        }

        let thread_id = self.assistant.create_thread().await?;
        info!(thread_id = %thread_id, "Created thread");
        if let Err(e) = self
            .registry
            .save_thread_and_export(&self.name, user, &thread_id, &settings.snapshot_path)
            .await
        {
            error!(error = %e, "Failed to write thread snapshot");
        }
        Ok(thread_id)
    }

    /// Runs the receive loop until `cancel` fires or `updates` closes.
    pub async fn run(self: Arc<Self>, updates: Box<dyn UpdateSource>, cancel: CancellationToken) {
        let name = self.name.clone();
        run_update_loop(&name, updates, cancel, self).await;
    }
}

#[async_trait]
impl UpdateHandler for Worker {
    async fn handle_update(&self, message: &Message) {
        let _ = self.handle_message(message).await;
    }
}
