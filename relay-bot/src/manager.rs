//! Manager bot: runtime administration of the worker fleet through chat commands.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use relay_core::{Bot, Command, Message, RelayError, UpdateSource};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::{BotDescriptor, RelayConfig};
use crate::fleet::{BotFleet, StartOutcome};
use crate::update_loop::{run_update_loop, UpdateHandler};
use crate::worker::WorkerSettings;

pub const USAGE: &str = "Commands:\n\
/list - show active bots\n\
/add <token> - start a new bot\n\
/reload - re-read the configuration and start new bots\n\
/help - show this message";

pub const RELOADED: &str = "Configuration reloaded and bots restarted.";
pub const UNKNOWN_COMMAND: &str = "Unknown command.";
pub const NOT_AUTHORIZED: &str = "Not authorized.";
pub const MISSING_TOKEN: &str = "Provide bot token.";

pub type SharedConfig = Arc<RwLock<RelayConfig>>;

pub struct Manager {
    bot: Arc<dyn Bot>,
    fleet: Arc<BotFleet>,
    config: SharedConfig,
    config_path: PathBuf,
}

impl Manager {
    pub fn new(
        bot: Arc<dyn Bot>,
        fleet: Arc<BotFleet>,
        config: SharedConfig,
        config_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bot,
            fleet,
            config,
            config_path: config_path.into(),
        }
    }

    /// Reply for `message`, or `None` when there is nothing to answer (no text).
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    pub async fn handle_message(&self, message: &Message) -> Option<String> {
        if message.content.trim().is_empty() {
            return None;
        }
        let Some(command) = message.command() else {
            return Some(USAGE.to_string());
        };
        info!(command = %command.name, "Manager command");

        let reply = match command.name.as_str() {
            "reload" | "add" => match self.authorize(message.chat.id).await {
                Err(e) => {
                    warn!(command = %command.name, error = %e, "Refusing manager command");
                    NOT_AUTHORIZED.to_string()
                }
                Ok(()) if command.name == "reload" => self.reload().await,
                Ok(()) => self.add(&command).await,
            },
            "list" => self.list().await,
            "help" | "start" => USAGE.to_string(),
            _ => UNKNOWN_COMMAND.to_string(),
        };
        Some(reply)
    }

    /// `/reload` and `/add` are limited to `adminChatIds` when that list is non-empty.
    async fn authorize(&self, chat_id: i64) -> relay_core::Result<()> {
        if self.config.read().await.is_admin(chat_id) {
            Ok(())
        } else {
            Err(RelayError::Unauthorized(chat_id))
        }
    }

    /// Re-reads the config file and starts every configured bot that is not running.
    async fn reload(&self) -> String {
        let new_config = match RelayConfig::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "Reload failed, keeping previous configuration");
                return format!("Failed to reload configuration: {}", e);
            }
        };

        {
            let current = self.config.read().await;
            if current.api_key != new_config.api_key || current.api_base_url != new_config.api_base_url
            {
                warn!("apiKey/apiBaseUrl changes take effect after a restart");
            }
        }
        self.fleet
            .update_settings(WorkerSettings::from_config(&new_config))
            .await;
        let bots = new_config.bot_tokens.clone();
        *self.config.write().await = new_config;

        let mut started = Vec::new();
        let mut failed = Vec::new();
        for bot in &bots {
            match self.fleet.start(bot).await {
                Ok(StartOutcome::Started(name)) => started.push(name),
                Ok(StartOutcome::AlreadyActive(_)) => {}
                Err(e) => {
                    error!(bot = %bot.name, error = %e, "Failed to start bot on reload");
                    failed.push(format!("{} ({})", bot.name, e));
                }
            }
        }

        let mut reply = RELOADED.to_string();
        if !started.is_empty() {
            reply.push_str(&format!("\nStarted: {}", at_names(&started)));
        }
        if !failed.is_empty() {
            reply.push_str(&format!("\nFailed: {}", failed.join(", ")));
        }
        reply
    }

    async fn list(&self) -> String {
        let mut reply = String::from("Active bots:");
        for name in self.fleet.active_names().await {
            reply.push_str(&format!("\n- @{}", name));
        }
        reply
    }

    async fn add(&self, command: &Command) -> String {
        let token = command.args.split_whitespace().next().unwrap_or_default();
        if token.is_empty() {
            return MISSING_TOKEN.to_string();
        }

        let name = match self.fleet.add_token(token).await {
            Ok(StartOutcome::Started(name)) => name,
            Ok(StartOutcome::AlreadyActive(name)) => {
                return format!("Bot @{} is already running.", name);
            }
            Err(e) => {
                warn!(error = %e, "Failed to add bot");
                return format!("Failed to add bot: {}", e);
            }
        };

        let mut config = self.config.write().await;
        let listed = config
            .bot_tokens
            .iter()
            .any(|b| b.token == token || b.name == name);
        if !listed {
            config.bot_tokens.push(BotDescriptor::new(name.clone(), token));
        }
        if config.persist_added_bots {
            if let Err(e) = config.write(&self.config_path) {
                error!(error = %e, "Failed to persist added bot");
                return format!("Bot added: @{} (not saved: {})", name, e);
            }
        }
        info!(bot = %name, "Bot added");
        format!("Bot added: @{}", name)
    }

    /// Runs the manager's receive loop until `cancel` fires or `updates` closes.
    pub async fn run(self: Arc<Self>, updates: Box<dyn UpdateSource>, cancel: CancellationToken) {
        run_update_loop("manager", updates, cancel, self).await;
    }
}

fn at_names(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("@{}", n))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl UpdateHandler for Manager {
    async fn handle_update(&self, message: &Message) {
        if let Some(reply) = self.handle_message(message).await {
            if let Err(e) = self.bot.reply_to(message, &reply).await {
                warn!(error = %e, "Failed to send manager reply");
            }
        }
    }
}
