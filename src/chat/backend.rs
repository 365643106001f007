use std::fmt;

use async_trait::async_trait;

use super::types::{ChatResponse, Conversation, DeleteAck};

/// Shown when a send fails without anything more specific to say.
pub const SEND_FALLBACK: &str = "Sorry, there was an error processing your message.";
pub const LOAD_FALLBACK: &str = "Failed to load conversation";
pub const DELETE_FALLBACK: &str = "Failed to delete conversation";

/// Errors surfaced by a [`ChatBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Request never completed (DNS, refused connection, TLS).
    Network(String),
    /// Server answered with a non-success status.
    Status { status: u16, message: String },
    /// Response body did not match the expected shape.
    Parse(String),
}

impl ApiError {
    /// Text fit for the error row under the message list.
    pub fn user_message(&self) -> String {
        self.user_message_or(SEND_FALLBACK)
    }

    /// Like [`user_message`](Self::user_message) with a caller-chosen
    /// fallback for errors that carry no server wording.
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// Builds a status error from a raw response body.
    ///
    /// JSON bodies contribute their `error`, `detail` or `message` field (in
    /// that order). Other non-empty bodies are used verbatim. Otherwise the
    /// caller's fallback applies.
    pub fn from_body(status: u16, body: &str, fallback: &str) -> Self {
        let message = extract_server_message(body)
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty() && !trimmed.starts_with('{')).then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| fallback.to_string());
        ApiError::Status { status, message }
    }
}

fn extract_server_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// The conversation operations the controller needs from a server.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Short label for logs and the header.
    fn name(&self) -> &str;

    async fn send_message(
        &self,
        text: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError>;

    /// Never fails: an unreachable or empty history reads as no conversations.
    async fn list_conversations(&self) -> Vec<Conversation>;

    async fn get_conversation(&self, id: &str) -> Result<Conversation, ApiError>;

    async fn delete_conversation(&self, id: &str) -> Result<DeleteAck, ApiError>;
}
