//! Conversation domain types shared by the client, the controller and the
//! endpoint server.
//!
//! Wire format is the JSON the legal-assistant backend speaks: snake_case
//! fields, RFC 3339 timestamps, roles as `"user"` / `"assistant"`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of characters of the first message shown as a conversation title.
pub const TITLE_PREVIEW_CHARS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A citation attached to an assistant answer.
///
/// The backend sends either bare URL strings or `{url, title}` objects;
/// both land here. A bare URL doubles as its own title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SourceWire")]
pub struct SourceRef {
    pub url: String,
    pub title: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceWire {
    Url(String),
    Object { url: String, title: Option<String> },
}

impl From<SourceWire> for SourceRef {
    fn from(wire: SourceWire) -> Self {
        match wire {
            SourceWire::Url(url) => SourceRef::from_url(url),
            SourceWire::Object { url, title } => match title {
                Some(title) if !title.is_empty() => SourceRef { url, title },
                _ => SourceRef::from_url(url),
            },
        }
    }
}

impl SourceRef {
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: url.clone(),
            url,
        }
    }
}

/// One turn in a conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl Message {
    /// A locally synthesized user message with a fresh id, stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            sources: Vec::new(),
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Vec<SourceRef>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            sources,
        }
    }

    /// Sources to show under the message.
    ///
    /// Explicit sources win. Assistant messages without any fall back to the
    /// URLs mentioned in the text, deduplicated in order of appearance.
    pub fn display_sources(&self) -> Vec<SourceRef> {
        if !self.sources.is_empty() {
            return self.sources.clone();
        }
        if self.role != Role::Assistant {
            return Vec::new();
        }
        extract_urls(&self.content)
            .into_iter()
            .map(SourceRef::from_url)
            .collect()
    }
}

/// A persisted exchange between one user and the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now", deserialize_with = "lenient_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, messages: Vec<Message>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            messages,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sidebar label: the opening of the first message, or a placeholder.
    pub fn title(&self) -> String {
        match self.messages.first() {
            Some(first) => {
                let preview: String = first.content.chars().take(TITLE_PREVIEW_CHARS).collect();
                format!("{preview}...")
            }
            None => "New conversation".to_string(),
        }
    }
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub conversation_id: String,
    pub message: Message,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl ChatResponse {
    /// The assistant message as it should be appended locally, carrying
    /// the response-level sources.
    pub fn into_assistant_message(self) -> Message {
        let mut message = self.message;
        if !self.sources.is_empty() || message.sources.is_empty() {
            message.sources = self.sources;
        }
        message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteAck {
    pub message: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Finds `http://` and `https://` links in free text.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for token in text.split_whitespace() {
        let Some(start) = token.find("http://").or_else(|| token.find("https://")) else {
            continue;
        };
        let url = token[start..].trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ')' | ']' | '"' | '\''));
        if url.len() > "https://".len() && !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Accepts RFC 3339 as well as naive ISO timestamps (assumed UTC), which is
/// what Python's `datetime.isoformat()` emits.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
