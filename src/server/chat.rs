//! `POST /api/chat`: the placeholder assistant.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use log::{info, warn};

use super::ServerState;
use super::auth::{ANONYMOUS_OWNER, Owner, bearer_token, owner_for};
use super::error::HandlerError;
use crate::chat::mock::placeholder_reply;
use crate::chat::store::StoreError;
use crate::chat::{ChatRequest, ChatResponse, Message};

/// Pulls a non-blank message out of a chat body. Bodies that fail to parse
/// count as carrying no message.
pub(super) fn require_message(
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<ChatRequest, HandlerError> {
    match payload {
        Ok(Json(request)) if !request.message.trim().is_empty() => Ok(request),
        Ok(_) => Err(HandlerError::BadRequest("Message is required")),
        Err(rejection) => {
            warn!("Unreadable chat body: {}", rejection);
            Err(HandlerError::BadRequest("Message is required"))
        }
    }
}

pub async fn chat(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, HandlerError> {
    let request = require_message(payload)?;
    let owner = bearer_token(&headers)
        .map(owner_for)
        .unwrap_or_else(|| Owner(ANONYMOUS_OWNER.to_string()));

    if !state.placeholder_delay.is_zero() {
        tokio::time::sleep(state.placeholder_delay).await;
    }

    let answer = Message::assistant(placeholder_reply(&request.message), Vec::new());
    let exchange = vec![Message::user(request.message.as_str()), answer.clone()];
    let conversation = match state
        .store
        .append(&owner.0, request.conversation_id.as_deref(), exchange.clone())
        .await
    {
        Err(StoreError::NotFound) => {
            info!(
                "Unknown conversation {:?}, starting a new one",
                request.conversation_id
            );
            state.store.append(&owner.0, None, exchange).await?
        }
        other => other?,
    };

    Ok(Json(ChatResponse {
        conversation_id: conversation.id,
        message: answer,
        sources: Vec::new(),
    }))
}
