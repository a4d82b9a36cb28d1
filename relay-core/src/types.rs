//! Core types: user, chat, inbound message and command parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Placeholder for updates without a sender (e.g. channel posts).
    pub fn unknown() -> Self {
        Self {
            id: 0,
            username: None,
            first_name: None,
            last_name: None,
        }
    }
}

/// Chat (channel or private) identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

/// A single inbound message with sender, chat and text content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    /// Message text; empty for non-text updates (stickers, photos, ...).
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Builds a private-chat text message where chat id equals user id.
    pub fn text(id: impl Into<String>, user_id: i64, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user: User {
                id: user_id,
                username: None,
                first_name: None,
                last_name: None,
            },
            chat: Chat {
                id: user_id,
                chat_type: "private".to_string(),
            },
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Sender id rendered as the registry's user key.
    pub fn user_key(&self) -> String {
        self.user.id.to_string()
    }

    /// Parses the message as a bot command, if it is one.
    pub fn command(&self) -> Option<Command> {
        Command::parse(&self.content)
    }
}

/// A bot command such as `/add 123:abc` or `/list@relay_manager_bot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name without the leading slash or `@botname` suffix.
    pub name: String,
    /// Everything after the command word, trimmed.
    pub args: String,
}

impl Command {
    /// Returns `None` unless `text` starts with `/` followed by a command word.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let (head, args) = match rest.find(char::is_whitespace) {
            Some(idx) => (&rest[..idx], rest[idx..].trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_lowercase(),
            args: args.to_string(),
        })
    }
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_with_args() {
        let cmd = Command::parse("/add 123456:ABC-def").unwrap();
        assert_eq!(cmd.name, "add");
        assert_eq!(cmd.args, "123456:ABC-def");
    }

    #[test]
    fn test_parse_command_strips_bot_suffix() {
        let cmd = Command::parse("/list@relay_manager_bot").unwrap();
        assert_eq!(cmd.name, "list");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_parse_command_rejects_plain_text() {
        assert!(Command::parse("hello").is_none());
        assert!(Command::parse("/").is_none());
        assert!(Command::parse("/@bot").is_none());
        assert!(Command::parse("").is_none());
    }

    #[test]
    fn test_message_text_helpers() {
        let msg = Message::text("1", 42, "/Reload now");
        assert_eq!(msg.user_key(), "42");
        assert_eq!(msg.chat.id, 42);
        let cmd = msg.command().unwrap();
        assert_eq!(cmd.name, "reload");
        assert_eq!(cmd.args, "now");
    }
}
