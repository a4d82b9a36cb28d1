//! Request and response bodies of the threads/runs API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub(crate) struct IdResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateRunRequest<'a> {
    pub assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunResponse {
    pub id: String,
    pub status: String,
    /// Object (`{"code", "message"}`) on the current API; a bare string on some proxies.
    #[serde(default)]
    pub last_error: Option<serde_json::Value>,
}

impl RunResponse {
    pub fn last_error_message(&self) -> Option<String> {
        match self.last_error.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Object(obj) => obj
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListMessagesResponse {
    #[serde(default)]
    pub data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextValue {
    pub value: String,
}

impl ThreadMessage {
    /// Concatenated text parts; `None` when the message has no text.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter(|part| part.kind == "text")
            .filter_map(|part| part.text.as_ref().map(|t| t.value.as_str()))
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}
