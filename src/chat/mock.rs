//! In-process backend for offline use (`lexi --offline`).
//!
//! Answers with the same placeholder text as the `/api/chat` endpoint and
//! keeps history in a [`MemoryStore`].

use std::time::Duration;

use async_trait::async_trait;
use log::debug;

use super::backend::{ApiError, ChatBackend};
use super::store::{ConversationStore, MemoryStore, StoreError};
use super::types::{ChatResponse, Conversation, DeleteAck, Message};

const LOCAL_OWNER: &str = "local";

/// The canned answer used while no real assistant is wired in.
pub fn placeholder_reply(message: &str) -> String {
    format!(
        "You said: \"{message}\". This is a placeholder response from the serverless function."
    )
}

pub struct MockBackend {
    store: MemoryStore,
    delay: Duration,
}

impl MockBackend {
    pub fn new(delay: Duration) -> Self {
        Self {
            store: MemoryStore::new(),
            delay,
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

fn store_error(err: StoreError) -> ApiError {
    let status = match err {
        StoreError::NotFound => 404,
        StoreError::Forbidden => 403,
    };
    ApiError::Status {
        status,
        message: err.to_string(),
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn name(&self) -> &str {
        "offline"
    }

    async fn send_message(
        &self,
        text: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let answer = Message::assistant(placeholder_reply(text), Vec::new());
        let conversation = self
            .store
            .append(
                LOCAL_OWNER,
                conversation_id,
                vec![Message::user(text), answer.clone()],
            )
            .await
            .map_err(store_error)?;
        debug!("Offline answer stored in {}", conversation.id);
        Ok(ChatResponse {
            conversation_id: conversation.id,
            message: answer,
            sources: Vec::new(),
        })
    }

    async fn list_conversations(&self) -> Vec<Conversation> {
        self.store.list(LOCAL_OWNER).await
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, ApiError> {
        self.store.get(LOCAL_OWNER, id).await.map_err(store_error)
    }

    async fn delete_conversation(&self, id: &str) -> Result<DeleteAck, ApiError> {
        self.store
            .delete(LOCAL_OWNER, id)
            .await
            .map_err(store_error)?;
        Ok(DeleteAck {
            message: "Conversation deleted".to_string(),
        })
    }
}
