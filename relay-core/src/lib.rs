//! # relay-core
//!
//! Core types and traits shared by the relay crates: [`Bot`], [`UpdateSource`], [`BotConnector`],
//! message and user types, command parsing, errors and tracing initialization.
//! Transport-agnostic; `relay-telegram` provides the Telegram implementations.

pub mod bot;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{Bot, BotConnector, ConnectedBot, UpdateSource};
pub use error::{RelayError, Result};
pub use logger::init_tracing;
pub use types::{Chat, Command, Message, ToCoreMessage, ToCoreUser, User};
