//! Shared (bot, user) → thread id map with snapshot import/export.

use std::collections::HashMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{RegistryError, Result};
use crate::snapshot::Snapshot;

type UserThreads = HashMap<String, String>;
type BotMap = HashMap<String, UserThreads>;

/// Identifies one conversation: the bot it happens on and the user talking to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadKey {
    pub bot: String,
    pub user: String,
}

impl ThreadKey {
    pub fn new(bot: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            bot: bot.into(),
            user: user.into(),
        }
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bot, self.user)
    }
}

/// Registry of assistant threads. Cloning yields another handle to the same map.
///
/// One mutex guards the whole map and every snapshot read/write, so operations from concurrent
/// bot workers are linearizable and a snapshot always reflects a single point in time.
#[derive(Debug, Clone, Default)]
pub struct ThreadRegistry {
    inner: Arc<Mutex<BotMap>>,
}

impl ThreadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry populated from `path`; a missing file yields an empty registry.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let registry = Self::new();
        registry.import(path).await?;
        Ok(registry)
    }

    /// Thread id for `(bot, user)`, if one was saved.
    pub async fn get_thread(&self, bot: &str, user: &str) -> Option<String> {
        let map = self.inner.lock().await;
        map.get(bot).and_then(|threads| threads.get(user)).cloned()
    }

    /// Associates `(bot, user)` with `thread_id`, replacing any previous id. Returns the previous id.
    pub async fn save_thread(&self, bot: &str, user: &str, thread_id: &str) -> Option<String> {
        let mut map = self.inner.lock().await;
        Self::insert_locked(&mut map, bot, user, thread_id)
    }

    /// Saves the association and rewrites the snapshot at `path` under one lock acquisition.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn save_thread_and_export(
        &self,
        bot: &str,
        user: &str,
        thread_id: &str,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let mut map = self.inner.lock().await;
        Self::insert_locked(&mut map, bot, user, thread_id);
        write_snapshot(path.as_ref(), &map).await
    }

    fn insert_locked(map: &mut BotMap, bot: &str, user: &str, thread_id: &str) -> Option<String> {
        let previous = map
            .entry(bot.to_string())
            .or_default()
            .insert(user.to_string(), thread_id.to_string());
        match &previous {
            Some(old) if old != thread_id => {
                warn!(bot, user, old_thread = %old, new_thread = %thread_id, "Replacing existing thread");
            }
            _ => debug!(bot, user, thread_id, "Thread saved"),
        }
        previous
    }

    /// Removes the mapping for `(bot, user)`; drops the bot's bucket once it is empty.
    pub async fn delete_thread(&self, bot: &str, user: &str) -> Option<String> {
        let mut map = self.inner.lock().await;
        let threads = map.get_mut(bot)?;
        let removed = threads.remove(user);
        if threads.is_empty() {
            map.remove(bot);
        }
        if removed.is_some() {
            debug!(bot, user, "Thread deleted");
        }
        removed
    }

    /// Number of (bot, user) entries.
    pub async fn len(&self) -> usize {
        let map = self.inner.lock().await;
        map.values().map(HashMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Bots that currently have at least one thread, sorted.
    pub async fn bot_names(&self) -> Vec<String> {
        let map = self.inner.lock().await;
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every mapping, sorted by key.
    pub async fn entries(&self) -> Vec<(ThreadKey, String)> {
        let map = self.inner.lock().await;
        let mut entries: Vec<(ThreadKey, String)> = map
            .iter()
            .flat_map(|(bot, threads)| {
                threads
                    .iter()
                    .map(move |(user, thread)| (ThreadKey::new(bot.clone(), user.clone()), thread.clone()))
            })
            .collect();
        entries.sort();
        entries
    }

    /// Writes the whole registry to `path` (via a temp file + rename).
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let map = self.inner.lock().await;
        write_snapshot(path.as_ref(), &map).await
    }

    /// Replaces the registry contents with the snapshot at `path`.
    ///
    /// A missing file clears the registry and is not an error.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub async fn import(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut map = self.inner.lock().await;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No thread snapshot found, starting empty");
                map.clear();
                return Ok(());
            }
            Err(source) => {
                return Err(RegistryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|source| RegistryError::Serialization {
                path: path.to_path_buf(),
                source,
            })?;
        *map = snapshot.into_map();
        info!(
            bots = map.len(),
            threads = map.values().map(HashMap::len).sum::<usize>(),
            "Thread snapshot imported"
        );
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

async fn write_snapshot(path: &Path, map: &BotMap) -> Result<()> {
    let io_err = |source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    };
    let snapshot = Snapshot::from_map(map);
    let bytes = serde_json::to_vec(&snapshot).map_err(|source| RegistryError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    debug!(threads = snapshot.len(), "Thread snapshot written");
    Ok(())
}
