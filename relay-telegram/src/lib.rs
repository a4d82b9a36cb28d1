//! # relay-telegram
//!
//! Telegram transport layer: teloxide adapters, [`relay_core::Bot`] implementation, long-poll
//! [`relay_core::UpdateSource`] and the token → bot [`relay_core::BotConnector`].
//! Handles only Telegram connectivity; no registry or assistant logic.

mod adapters;
mod bot_adapter;
mod config;
mod connector;
mod poller;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use config::TelegramConfig;
pub use connector::TelegramConnector;
pub use poller::TelegramUpdateSource;
