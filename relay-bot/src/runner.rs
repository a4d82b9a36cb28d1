//! Startup and shutdown: wires config, registry, log sink, manager and workers together.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use assistant_client::{mask_token, Assistant, AssistantClient};
use relay_core::{init_tracing, BotConnector};
use relay_telegram::{TelegramConfig, TelegramConnector};
use thread_registry::ThreadRegistry;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::RelayConfig;
use crate::fleet::{BotFleet, StartOutcome};
use crate::log_sink::{LogHandle, LogSink, DEFAULT_CAPACITY};
use crate::manager::{Manager, SharedConfig};
use crate::worker::WorkerSettings;

/// A running relay: the manager task plus the worker fleet.
pub struct Relay {
    fleet: Arc<BotFleet>,
    config: SharedConfig,
    manager_task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Relay {
    /// Connects the manager bot, starts a worker per configured bot and spawns the manager loop.
    ///
    /// A rejected manager token is fatal; a worker that fails to start is logged and skipped.
    #[instrument(skip_all)]
    pub async fn start(
        config: RelayConfig,
        config_path: impl Into<PathBuf>,
        connector: Arc<dyn BotConnector>,
        assistant: Arc<dyn Assistant>,
        registry: ThreadRegistry,
        log: LogHandle,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let manager_bot = connector
            .connect(&config.manager_bot_token)
            .await
            .context("Manager bot token was rejected")?;
        info!(manager = %manager_bot.name, "Manager bot connected");

        let fleet = Arc::new(BotFleet::new(
            connector,
            assistant,
            registry,
            WorkerSettings::from_config(&config),
            log,
            cancel.child_token(),
        ));
        for bot in &config.bot_tokens {
            match fleet.start(bot).await {
                Ok(StartOutcome::Started(_)) => {}
                Ok(StartOutcome::AlreadyActive(name)) => {
                    warn!(bot = %name, "Bot listed twice, already running")
                }
                Err(e) => error!(
                    bot = %bot.name,
                    token = %mask_token(&bot.token),
                    error = %e,
                    "Failed to start bot"
                ),
            }
        }

        let config: SharedConfig = Arc::new(RwLock::new(config));
        let manager = Arc::new(Manager::new(
            manager_bot.bot,
            fleet.clone(),
            config.clone(),
            config_path,
        ));
        let manager_task = tokio::spawn(manager.run(manager_bot.updates, cancel.child_token()));

        Ok(Self {
            fleet,
            config,
            manager_task,
            cancel,
        })
    }

    pub fn fleet(&self) -> &Arc<BotFleet> {
        &self.fleet
    }

    /// Live configuration, as modified by `/reload` and `/add`.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Cancels every loop and waits for the manager and all workers to stop.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.manager_task.await {
            error!(error = %e, "Manager task ended abnormally");
        }
        self.fleet.shutdown().await;
        info!("All bots stopped");
    }
}

/// Main entry: runs the relay with the config at `config_path` until Ctrl-C.
pub async fn run(config_path: &Path, log_file: &str) -> Result<()> {
    init_tracing(log_file)?;

    let config = RelayConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    info!(
        config = %config_path.display(),
        bots = config.bot_tokens.len(),
        api_key = %mask_token(&config.api_key),
        "Configuration loaded"
    );
    if config.admin_chat_ids.is_empty() {
        warn!("adminChatIds is empty: any chat can /reload and /add on the manager bot");
    }

    let registry = ThreadRegistry::load(config.threads_path())
        .await
        .context("Failed to import thread snapshot")?;
    let (log, sink) = LogSink::spawn(config.log_path(), DEFAULT_CAPACITY);

    let assistant: Arc<dyn Assistant> = Arc::new(
        AssistantClient::with_base_url(config.api_key.clone(), config.api_base_url.clone())
            .with_poll_policy(config.run_poll.to_policy()),
    );
    let connector: Arc<dyn BotConnector> =
        Arc::new(TelegramConnector::new(TelegramConfig::from_env()?));

    let cancel = CancellationToken::new();
    let relay = Relay::start(
        config,
        config_path,
        connector,
        assistant,
        registry,
        log,
        cancel,
    )
    .await?;
    info!("Relay started");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown requested");

    relay.shutdown().await;
    if let Err(e) = sink.await {
        error!(error = %e, "Log sink ended abnormally");
    }
    Ok(())
}
