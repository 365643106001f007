//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::auth::{AuthAdapter, AuthError, AuthState, DeviceCode, Profile};
use crate::chat::{
    ApiError, ChatBackend, ChatResponse, Conversation, DeleteAck, Message,
};

/// A backend that answers from scripted queues and records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub replies: Mutex<VecDeque<Result<ChatResponse, ApiError>>>,
    pub listing: Mutex<Vec<Conversation>>,
    pub stored: Mutex<Vec<Conversation>>,
    pub delete_error: Mutex<Option<ApiError>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful answer for the next send.
    pub fn reply(self, conversation_id: &str, content: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(ChatResponse {
            conversation_id: conversation_id.to_string(),
            message: Message::assistant(content, Vec::new()),
            sources: Vec::new(),
        }));
        self
    }

    pub fn fail_send(self, err: ApiError) -> Self {
        self.replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_conversation(self, conversation: Conversation) -> Self {
        self.stored.lock().unwrap().push(conversation.clone());
        self.listing.lock().unwrap().push(conversation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    fn name(&self) -> &str {
        "fake"
    }

    async fn send_message(
        &self,
        text: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        self.record(format!("send:{text}:{}", conversation_id.unwrap_or("-")));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted reply".into())))
    }

    async fn list_conversations(&self) -> Vec<Conversation> {
        self.record("list".into());
        self.listing.lock().unwrap().clone()
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, ApiError> {
        self.record(format!("get:{id}"));
        self.stored
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                message: "Conversation not found".into(),
            })
    }

    async fn delete_conversation(&self, id: &str) -> Result<DeleteAck, ApiError> {
        self.record(format!("delete:{id}"));
        if let Some(err) = self.delete_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.stored.lock().unwrap().retain(|c| c.id != id);
        self.listing.lock().unwrap().retain(|c| c.id != id);
        Ok(DeleteAck {
            message: "Conversation deleted".into(),
        })
    }
}

/// An auth adapter whose login always succeeds immediately.
#[derive(Default)]
pub struct FakeAuth {
    pub state: Mutex<AuthState>,
}

impl FakeAuth {
    pub fn signed_in() -> Self {
        Self {
            state: Mutex::new(test_user_state()),
        }
    }
}

pub fn test_user_state() -> AuthState {
    AuthState {
        is_authenticated: true,
        is_loading: false,
        user: Some(Profile {
            name: Some("Jan Kowalski".into()),
            email: Some("jan@example.com".into()),
            picture: None,
        }),
    }
}

pub fn test_device_code() -> DeviceCode {
    DeviceCode {
        device_code: "dev-123".into(),
        user_code: "ABCD-EFGH".into(),
        verification_uri: "https://tenant.auth0.com/activate".into(),
        verification_uri_complete: None,
        expires_in: 900,
        interval: 5,
    }
}

#[async_trait]
impl AuthAdapter for FakeAuth {
    fn state(&self) -> AuthState {
        self.state.lock().unwrap().clone()
    }

    async fn access_token(&self) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .is_authenticated
            .then(|| "test-token".to_string())
    }

    async fn start_login(&self) -> Result<DeviceCode, AuthError> {
        Ok(test_device_code())
    }

    async fn complete_login(&self, _code: &DeviceCode) -> Result<AuthState, AuthError> {
        let state = test_user_state();
        *self.state.lock().unwrap() = state.clone();
        Ok(state)
    }

    async fn logout(&self) {
        *self.state.lock().unwrap() = AuthState::default();
    }
}
