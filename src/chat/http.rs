//! [`ChatBackend`] over the legal-assistant REST API.
//!
//! Every request asks the auth adapter for a token and attaches
//! `Authorization: Bearer ...` only when one comes back, so anonymous use
//! keeps working against servers that allow it.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;

use super::backend::{ApiError, ChatBackend, DELETE_FALLBACK, LOAD_FALLBACK};
use super::types::{ChatRequest, ChatResponse, Conversation, DeleteAck};
use crate::auth::AuthAdapter;

const SEND_FAILED: &str = "Failed to get answer";

pub struct HttpChatClient {
    base_url: String,
    client: reqwest::Client,
    auth: Arc<dyn AuthAdapter>,
}

impl HttpChatClient {
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthAdapter>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// `{base}/api/conversations/{id}` with `id` percent-encoded as one
    /// path segment.
    fn conversation_url(&self, id: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Network(format!("invalid API URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::Network(format!("invalid API URL {}", self.base_url)))?
            .pop_if_empty()
            .extend(["api", "conversations"])
            .push(id);
        Ok(url)
    }

    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth.access_token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and decodes a success body, turning everything else
    /// into an [`ApiError`] carrying the server's own wording when present.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        decode(response, fallback).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, ApiError> {
    let status = response.status();
    debug!("{} {}", status.as_u16(), response.url());
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_body(status.as_u16(), &body, fallback);
        warn!("Request failed: {}", err);
        return Err(err);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn send_message(
        &self,
        text: &str,
        conversation_id: Option<&str>,
    ) -> Result<ChatResponse, ApiError> {
        info!(
            "Sending message ({} chars, conversation={:?})",
            text.len(),
            conversation_id
        );
        let body = ChatRequest {
            message: text.to_string(),
            conversation_id: conversation_id.map(str::to_string),
        };
        let request = self.client.post(self.url("/chat")).json(&body);
        self.execute(request, SEND_FAILED).await
    }

    async fn list_conversations(&self) -> Vec<Conversation> {
        let request = self.client.get(self.url("/conversations"));
        match self.execute::<Vec<Conversation>>(request, LOAD_FALLBACK).await {
            Ok(list) => {
                debug!("Fetched {} conversations", list.len());
                list
            }
            Err(ApiError::Status { status: 404, .. }) => {
                debug!("Conversation history not available, treating as empty");
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to fetch conversations: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation, ApiError> {
        let request = self.client.get(self.conversation_url(id)?);
        self.execute(request, LOAD_FALLBACK).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<DeleteAck, ApiError> {
        info!("Deleting conversation {}", id);
        let request = self.client.delete(self.conversation_url(id)?);
        self.execute(request, DELETE_FALLBACK).await
    }
}
