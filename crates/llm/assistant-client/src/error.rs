//! Assistant client error types.

use std::time::Duration;
use thiserror::Error;

/// Errors from talking to the assistant service.
///
/// `Transport`, `Status` and `Decode` are all transport failures (see [`AssistantError::is_transport`]);
/// the rest describe how a run ended.
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("{op}: request failed: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{op}: API returned HTTP {status}: {body}")]
    Status {
        op: &'static str,
        status: u16,
        body: String,
    },

    #[error("{op}: invalid response body: {source}")]
    Decode {
        op: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("run {run_id} ended with status {status}: {}", .last_error.as_deref().unwrap_or("no error details"))]
    RunFailed {
        run_id: String,
        status: String,
        last_error: Option<String>,
    },

    #[error("run {run_id} did not finish within {waited:?}")]
    RunTimeout { run_id: String, waited: Duration },

    #[error("thread {thread_id} has no reply")]
    EmptyResult { thread_id: String },
}

impl AssistantError {
    /// True for network, non-2xx and decode failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Status { .. } | Self::Decode { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
