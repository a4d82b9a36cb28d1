//! Active worker set: one task per bot account, started through a [`BotConnector`].
//!
//! Workers are keyed by the account username reported on connect; that name is also the
//! registry's bot key. A token that is already running is never connected twice.

use std::sync::Arc;

use assistant_client::Assistant;
use relay_core::{BotConnector, ConnectedBot, Result};
use thread_registry::ThreadRegistry;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::config::BotDescriptor;
use crate::log_sink::LogHandle;
use crate::worker::{SharedSettings, Worker, WorkerSettings};

/// Result of asking the fleet to start a bot; carries the account name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started(String),
    AlreadyActive(String),
}

struct ActiveBot {
    name: String,
    token: String,
    handle: JoinHandle<()>,
}

/// Owns the running workers. Every worker shares the registry, the log sink and the settings.
pub struct BotFleet {
    connector: Arc<dyn BotConnector>,
    assistant: Arc<dyn Assistant>,
    registry: ThreadRegistry,
    settings: SharedSettings,
    log: LogHandle,
    cancel: CancellationToken,
    /// Kept in start order. Never held across `connect`.
    active: Mutex<Vec<ActiveBot>>,
}

impl BotFleet {
    pub fn new(
        connector: Arc<dyn BotConnector>,
        assistant: Arc<dyn Assistant>,
        registry: ThreadRegistry,
        settings: WorkerSettings,
        log: LogHandle,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector,
            assistant,
            registry,
            settings: Arc::new(tokio::sync::RwLock::new(settings)),
            log,
            cancel,
            active: Mutex::new(Vec::new()),
        }
    }

    /// Starts the worker for a configured bot unless its token or account is already running.
    #[instrument(skip(self, bot), fields(bot = %bot.name))]
    pub async fn start(&self, bot: &BotDescriptor) -> Result<StartOutcome> {
        let outcome = self.start_token(&bot.token).await?;
        if let StartOutcome::Started(account) = &outcome {
            if account != &bot.name {
                warn!(
                    configured = %bot.name,
                    account = %account,
                    "Configured name differs from the account, keying by account"
                );
            }
        }
        Ok(outcome)
    }

    /// Validates `token` and starts a worker named after the bot account.
    pub async fn add_token(&self, token: &str) -> Result<StartOutcome> {
        self.start_token(token).await
    }

    async fn start_token(&self, token: &str) -> Result<StartOutcome> {
        {
            let mut active = self.active.lock().await;
            prune_finished(&mut active);
            if let Some(running) = active.iter().find(|a| a.token == token) {
                return Ok(StartOutcome::AlreadyActive(running.name.clone()));
            }
        }

        let connected = self.connector.connect(token).await?;

        let mut active = self.active.lock().await;
        prune_finished(&mut active);
        if let Some(running) = active
            .iter()
            .find(|a| a.token == token || a.name == connected.name)
        {
            return Ok(StartOutcome::AlreadyActive(running.name.clone()));
        }
        let name = connected.name.clone();
        self.spawn_worker(&mut active, token, connected);
        Ok(StartOutcome::Started(name))
    }

    fn spawn_worker(&self, active: &mut Vec<ActiveBot>, token: &str, connected: ConnectedBot) {
        let name = connected.name;
        let worker = Arc::new(Worker::new(
            name.clone(),
            connected.bot,
            self.assistant.clone(),
            self.registry.clone(),
            self.settings.clone(),
            self.log.clone(),
        ));
        let handle = tokio::spawn(worker.run(connected.updates, self.cancel.child_token()));
        info!(bot = %name, "Worker started");
        active.push(ActiveBot {
            name,
            token: token.to_string(),
            handle,
        });
    }

    /// Names of running workers, in start order.
    pub async fn active_names(&self) -> Vec<String> {
        let active = self.active.lock().await;
        active
            .iter()
            .filter(|a| !a.handle.is_finished())
            .map(|a| a.name.clone())
            .collect()
    }

    pub async fn is_running(&self, name: &str) -> bool {
        let active = self.active.lock().await;
        active
            .iter()
            .any(|a| a.name == name && !a.handle.is_finished())
    }

    /// Replaces the settings every worker reads for its next message.
    pub async fn update_settings(&self, settings: WorkerSettings) {
        *self.settings.write().await = settings;
    }

    pub async fn settings(&self) -> WorkerSettings {
        self.settings.read().await.clone()
    }

    /// Cancels every worker and waits for them to stop.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let workers: Vec<ActiveBot> = self.active.lock().await.drain(..).collect();
        for worker in workers {
            if let Err(e) = worker.handle.await {
                error!(bot = %worker.name, error = %e, "Worker task ended abnormally");
            }
        }
    }
}

fn prune_finished(active: &mut Vec<ActiveBot>) {
    active.retain(|a| {
        let finished = a.handle.is_finished();
        if finished {
            info!(bot = %a.name, "Removing stopped worker");
        }
        !finished
    });
}
