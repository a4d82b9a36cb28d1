//! HTTP client for the threads/runs API.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::{AssistantError, Result};
use crate::mask_token;
use crate::poll::{PollPolicy, RunStatus};
use crate::wire::{
    CreateMessageRequest, CreateRunRequest, IdResponse, ListMessagesResponse, RunResponse,
};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_VALUE: &str = "assistants=v2";

/// Snapshot of a run returned by a single status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo {
    pub id: String,
    pub status: RunStatus,
    pub last_error: Option<String>,
}

/// One completed assistant invocation: the input, the run that processed it and the reply.
#[derive(Debug, Clone)]
pub struct ConversationRun {
    pub input: String,
    pub run_id: String,
    pub status: RunStatus,
    pub reply: String,
    /// Number of status checks made before the run finished.
    pub polls: u32,
}

/// Assistant API client. Cheap to clone; shares one connection pool.
#[derive(Clone)]
pub struct AssistantClient {
    http: Client,
    api_key: String,
    base_url: String,
    poll: PollPolicy,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantClient")
            .field("api_key", &mask_token(&self.api_key))
            .field("base_url", &self.base_url)
            .field("poll", &self.poll)
            .finish()
    }
}

impl AssistantClient {
    /// Builds a client using the given API key and the default API base URL.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE.to_string())
    }

    /// Builds a client with a custom base URL (e.g. for proxies or a mock server).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            poll: PollPolicy::default(),
        }
    }

    /// Replaces the run polling policy.
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Adds auth + beta headers, sends, and decodes a 2xx JSON body.
    async fn send<T: DeserializeOwned>(&self, op: &'static str, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.api_key)
            .header(BETA_HEADER, BETA_VALUE)
            .send()
            .await
            .map_err(|source| AssistantError::Transport { op, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                op,
                status = status.as_u16(),
                api_key = %mask_token(&self.api_key),
                "Assistant API returned error status"
            );
            return Err(AssistantError::Status {
                op,
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| AssistantError::Transport { op, source })?;
        serde_json::from_slice(&bytes).map_err(|source| AssistantError::Decode { op, source })
    }

    /// Creates an empty conversation thread and returns its id.
    #[instrument(skip(self))]
    pub async fn create_thread(&self) -> Result<String> {
        let created: IdResponse = self
            .send("create_thread", self.http.post(self.url("/threads")))
            .await?;
        info!(thread_id = %created.id, "Thread created");
        Ok(created.id)
    }

    /// Appends a user message to the thread.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn post_message(&self, thread_id: &str, text: &str) -> Result<()> {
        let body = CreateMessageRequest {
            role: "user",
            content: text,
        };
        let created: IdResponse = self
            .send(
                "post_message",
                self.http
                    .post(self.url(&format!("/threads/{}/messages", thread_id)))
                    .json(&body),
            )
            .await?;
        debug!(message_id = %created.id, "User message posted");
        Ok(())
    }

    /// Starts a run of `assistant_id` over the thread and returns the run id.
    #[instrument(skip(self))]
    pub async fn start_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let body = CreateRunRequest { assistant_id };
        let run: RunResponse = self
            .send(
                "start_run",
                self.http
                    .post(self.url(&format!("/threads/{}/runs", thread_id)))
                    .json(&body),
            )
            .await?;
        info!(run_id = %run.id, status = %run.status, "Run created");
        Ok(run.id)
    }

    /// Single status check of a run.
    pub async fn poll_run(&self, thread_id: &str, run_id: &str) -> Result<RunInfo> {
        let run: RunResponse = self
            .send(
                "poll_run",
                self.http
                    .get(self.url(&format!("/threads/{}/runs/{}", thread_id, run_id))),
            )
            .await?;
        let last_error = run.last_error_message();
        Ok(RunInfo {
            status: RunStatus::parse(&run.status),
            id: run.id,
            last_error,
        })
    }

    /// Returns the text of the newest message in the thread.
    #[instrument(skip(self))]
    pub async fn fetch_latest_reply(&self, thread_id: &str) -> Result<String> {
        let list: ListMessagesResponse = self
            .send(
                "fetch_latest_reply",
                self.http
                    .get(self.url(&format!("/threads/{}/messages", thread_id)))
                    .query(&[("order", "desc"), ("limit", "1")]),
            )
            .await?;

        let empty = || AssistantError::EmptyResult {
            thread_id: thread_id.to_string(),
        };
        let newest = list.data.first().ok_or_else(empty)?;
        let text = newest.text().ok_or_else(empty)?;
        debug!(message_id = %newest.id, role = %newest.role, reply_len = text.len(), "Latest reply fetched");
        Ok(text)
    }

    /// Polls the run with exponential backoff until it reaches a terminal status.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<(RunStatus, u32)> {
        let started = Instant::now();
        let mut interval = self.poll.initial_interval;
        let mut polls = 0u32;

        loop {
            let run = self.poll_run(thread_id, run_id).await?;
            polls += 1;
            debug!(run_id, status = %run.status, polls, "Run polled");

            if run.status.is_success() {
                return Ok((run.status, polls));
            }
            if run.status.is_failure() {
                return Err(AssistantError::RunFailed {
                    run_id: run_id.to_string(),
                    status: run.status.to_string(),
                    last_error: run.last_error,
                });
            }

            let waited = started.elapsed();
            if waited >= self.poll.timeout {
                return Err(AssistantError::RunTimeout {
                    run_id: run_id.to_string(),
                    waited,
                });
            }
            let remaining = self.poll.timeout - waited;
            tokio::time::sleep(interval.min(remaining).max(Duration::from_millis(1))).await;
            interval = self.poll.next_interval(interval);
        }
    }

    /// Posts the message, runs the assistant, waits for the run and fetches the reply.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn run_conversation(
        &self,
        text: &str,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<ConversationRun> {
        self.post_message(thread_id, text).await?;
        let run_id = self.start_run(thread_id, assistant_id).await?;
        let (status, polls) = self.wait_for_run(thread_id, &run_id).await?;
        let reply = self.fetch_latest_reply(thread_id).await?;
        info!(run_id = %run_id, polls, reply_len = reply.len(), "Run completed");
        Ok(ConversationRun {
            input: text.to_string(),
            run_id,
            status,
            reply,
            polls,
        })
    }

    /// Like [`run_conversation`](Self::run_conversation) but returns only the reply text.
    pub async fn handle_message(
        &self,
        text: &str,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<String> {
        self.run_conversation(text, thread_id, assistant_id)
            .await
            .map(|run| run.reply)
    }
}
