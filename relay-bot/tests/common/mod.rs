//! In-memory stand-ins for the chat transport and the assistant service.
//!
//! Sent messages and assistant calls are recorded through channels/mutexes so tests can wait for
//! them without touching Telegram or the assistant API.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant_client::{Assistant, AssistantError};
use async_trait::async_trait;
use relay_core::{Bot, BotConnector, Chat, ConnectedBot, Message, RelayError, Result, UpdateSource};
use tokio::sync::mpsc;

/// One recorded `send_message(chat, text)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub text: String,
}

/// Bot that records every message it is asked to send.
pub struct MockBot {
    sent_tx: mpsc::UnboundedSender<SentMessage>,
}

impl MockBot {
    pub fn with_receiver() -> (Arc<Self>, mpsc::UnboundedReceiver<SentMessage>) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        (Arc::new(Self { sent_tx }), sent_rx)
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        let _ = self.sent_tx.send(SentMessage {
            chat_id: chat.id,
            text: text.to_string(),
        });
        Ok(())
    }
}

pub type BatchSender = mpsc::UnboundedSender<Result<Vec<Message>>>;

/// Update source fed by the test; dropping the sender closes it.
pub struct ChannelUpdateSource {
    rx: mpsc::UnboundedReceiver<Result<Vec<Message>>>,
}

impl ChannelUpdateSource {
    pub fn new() -> (BatchSender, Box<dyn UpdateSource>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Box::new(Self { rx }))
    }
}

#[async_trait]
impl UpdateSource for ChannelUpdateSource {
    async fn next_batch(&mut self) -> Result<Option<Vec<Message>>> {
        match self.rx.recv().await {
            Some(Ok(batch)) => Ok(Some(batch)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}

/// Test-side ends of a connected mock bot.
pub struct MockAccount {
    pub updates: BatchSender,
    pub sent: mpsc::UnboundedReceiver<SentMessage>,
}

/// Connector that knows a fixed set of tokens; anything else fails like a rejected getMe.
#[derive(Default)]
pub struct MockConnector {
    names: Mutex<HashMap<String, String>>,
    accounts: Mutex<HashMap<String, MockAccount>>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(tokens: &[(&str, &str)]) -> Arc<Self> {
        let connector = Self::default();
        {
            let mut names = connector.names.lock().unwrap();
            for (token, name) in tokens {
                names.insert(token.to_string(), name.to_string());
            }
        }
        Arc::new(connector)
    }

    /// Takes the channels of the most recent connection for `name`.
    pub fn take_account(&self, name: &str) -> Option<MockAccount> {
        self.accounts.lock().unwrap().remove(name)
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BotConnector for MockConnector {
    async fn connect(&self, token: &str) -> Result<ConnectedBot> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let name = self
            .names
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| RelayError::Bot("getMe failed: Unauthorized".to_string()))?;

        let (bot, sent) = MockBot::with_receiver();
        let (updates_tx, updates) = ChannelUpdateSource::new();
        self.accounts.lock().unwrap().insert(
            name.clone(),
            MockAccount {
                updates: updates_tx,
                sent,
            },
        );
        Ok(ConnectedBot { name, bot, updates })
    }
}

/// One recorded `handle_message(text, thread_id, assistant_id)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantCall {
    pub text: String,
    pub thread_id: String,
    pub assistant_id: String,
}

/// Assistant that answers every message with a fixed reply.
///
/// Text `"fail"` yields a failed run, `"boom"` panics and `"hang"` never finishes.
pub struct ScriptedAssistant {
    reply: String,
    threads_created: AtomicUsize,
    calls: Mutex<Vec<AssistantCall>>,
}

impl ScriptedAssistant {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            threads_created: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn threads_created(&self) -> usize {
        self.threads_created.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<AssistantCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn create_thread(&self) -> assistant_client::Result<String> {
        let n = self.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_{}", n))
    }

    async fn handle_message(
        &self,
        text: &str,
        thread_id: &str,
        assistant_id: &str,
    ) -> assistant_client::Result<String> {
        self.calls.lock().unwrap().push(AssistantCall {
            text: text.to_string(),
            thread_id: thread_id.to_string(),
            assistant_id: assistant_id.to_string(),
        });
        match text {
            "boom" => panic!("assistant exploded"),
            "hang" => std::future::pending::<assistant_client::Result<String>>().await,
            "fail" => Err(AssistantError::RunFailed {
                run_id: "run_1".to_string(),
                status: "failed".to_string(),
                last_error: Some("model overloaded".to_string()),
            }),
            _ => Ok(self.reply.clone()),
        }
    }
}

/// Waits for the next sent message, failing the test after a few seconds.
pub async fn next_sent(rx: &mut mpsc::UnboundedReceiver<SentMessage>) -> SentMessage {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a sent message")
        .expect("bot channel closed")
}

/// Polls `check` until it returns true or a few seconds pass.
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
