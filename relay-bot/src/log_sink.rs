//! Conversation log: one consumer task owns the file, producers send lines over a channel.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Channel capacity used by the runner.
pub const DEFAULT_CAPACITY: usize = 256;

/// Producer side of the log sink. Clone freely; the sink stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct LogHandle {
    tx: mpsc::Sender<String>,
}

impl LogHandle {
    /// Queues `line`, waiting for channel capacity.
    pub async fn log(&self, line: impl Into<String>) {
        if self.tx.send(line.into()).await.is_err() {
            warn!("Log sink is closed, dropping line");
        }
    }
}

/// Append-only line logger.
pub struct LogSink;

impl LogSink {
    /// Starts the consumer task writing to `path`.
    pub fn spawn(path: impl Into<PathBuf>, capacity: usize) -> (LogHandle, JoinHandle<()>) {
        let path = path.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::spawn(drain(path, rx));
        (LogHandle { tx }, task)
    }
}

async fn drain(path: PathBuf, mut rx: mpsc::Receiver<String>) {
    debug!(path = %path.display(), "Log sink started");
    while let Some(line) = rx.recv().await {
        if line.is_empty() {
            continue;
        }
        if let Err(e) = append_line(&path, &line).await {
            error!(path = %path.display(), error = %e, "Failed to append to log file");
        }
    }
    debug!(path = %path.display(), "Log sink stopped");
}

/// Opens, appends `line\n` and closes the file.
async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    let mut buf = Vec::with_capacity(line.len() + 1);
    buf.extend_from_slice(line.as_bytes());
    buf.push(b'\n');
    file.write_all(&buf).await?;
    file.flush().await
}
