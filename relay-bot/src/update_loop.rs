//! Receive loop shared by the manager and every worker.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use relay_core::{Message, UpdateSource};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Delay before asking the transport again after a receive error.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Processes one inbound message. Errors are reported by the implementation itself.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle_update(&self, message: &Message);
}

/// Pulls batches from `updates` and hands each message to `handler`, in arrival order.
///
/// Returns when `cancel` fires or the source reports it is closed; a message still being handled
/// at cancellation is abandoned. A panic inside the handler is caught and logged; the loop keeps
/// going with the next message.
pub async fn run_update_loop(
    name: &str,
    mut updates: Box<dyn UpdateSource>,
    cancel: CancellationToken,
    handler: Arc<dyn UpdateHandler>,
) {
    info!(bot = %name, "Receive loop started");
    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            batch = updates.next_batch() => batch,
        };

        match batch {
            Ok(Some(messages)) => {
                for message in messages {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let outcome = tokio::select! {
                        _ = cancel.cancelled() => break,
                        outcome = AssertUnwindSafe(handler.handle_update(&message)).catch_unwind() => outcome,
                    };
                    if outcome.is_err() {
                        error!(
                            bot = %name,
                            user_id = message.user.id,
                            message_id = %message.id,
                            "Handler panicked, skipping update"
                        );
                    }
                }
            }
            Ok(None) => {
                info!(bot = %name, "Update source closed");
                break;
            }
            Err(e) => {
                warn!(bot = %name, error = %e, "Receiving updates failed, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        }
    }
    info!(bot = %name, "Receive loop stopped");
}
