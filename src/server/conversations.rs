//! `/api/conversations`: per-owner conversation history.
//!
//! Routed behind [`require_bearer`](super::auth::require_bearer), so every
//! handler sees an [`Owner`].

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use log::info;

use super::ServerState;
use super::auth::Owner;
use super::error::HandlerError;
use crate::chat::{Conversation, DeleteAck};

pub async fn list(
    State(state): State<Arc<ServerState>>,
    Extension(owner): Extension<Owner>,
) -> Json<Vec<Conversation>> {
    Json(state.store.list(&owner.0).await)
}

pub async fn create(
    State(state): State<Arc<ServerState>>,
    Extension(owner): Extension<Owner>,
) -> (StatusCode, Json<Conversation>) {
    let conversation = state.store.create(&owner.0).await;
    (StatusCode::CREATED, Json(conversation))
}

pub async fn get_one(
    State(state): State<Arc<ServerState>>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, HandlerError> {
    Ok(Json(state.store.get(&owner.0, &id).await?))
}

pub async fn delete_one(
    State(state): State<Arc<ServerState>>,
    Extension(owner): Extension<Owner>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, HandlerError> {
    state.store.delete(&owner.0, &id).await?;
    info!("Deleted conversation {}", id);
    Ok(Json(DeleteAck {
        message: "Conversation deleted".to_string(),
    }))
}
