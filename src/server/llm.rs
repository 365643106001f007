//! `POST /api/chat-ai`: relays the question to an OpenAI-compatible chat
//! completions endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::ServerState;
use super::chat::require_message;
use super::error::HandlerError;
use crate::chat::{ChatRequest, ChatResponse, Message};
use crate::core::config::ResolvedConfig;

const TEMPERATURE: f32 = 0.7;

/// Where and how to reach the LLM.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_prompt: String,
}

impl LlmSettings {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }
}

// ============================================================================
// Chat Completions API Types
// ============================================================================

#[derive(Serialize, Debug)]
struct CompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize, Debug)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

// ============================================================================
// Handler
// ============================================================================

pub async fn chat_ai(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let request = require_message(payload)?;
    let llm = &state.llm;
    let api_key = llm.api_key.as_deref().ok_or_else(|| {
        HandlerError::internal("OpenAI API key is not configured", "OPENAI_API_KEY unset")
    })?;

    let body = CompletionRequest {
        model: &llm.model,
        messages: vec![
            CompletionMessage {
                role: "system",
                content: &llm.system_prompt,
            },
            CompletionMessage {
                role: "user",
                content: &request.message,
            },
        ],
        temperature: TEMPERATURE,
    };
    info!("Forwarding question to {} ({})", llm.base_url, llm.model);

    let response = state
        .http
        .post(format!("{}/chat/completions", llm.base_url))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|e| HandlerError::internal("Internal server error", e))?;

    let status = response.status();
    debug!("AI service status: {}", status);
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let details = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));
        return Err(HandlerError::Upstream {
            status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            details,
        });
    }

    let completion: CompletionResponse = response
        .json()
        .await
        .map_err(|e| HandlerError::internal("Internal server error", e))?;
    let content = completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| HandlerError::internal("Internal server error", "no choices in completion"))?;

    Ok(Json(ChatResponse {
        conversation_id: request
            .conversation_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        message: Message::assistant(content, Vec::new()),
        sources: Vec::new(),
    }))
}
