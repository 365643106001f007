//! # Endpoint Server
//!
//! The HTTP surface the client talks to, started with `lexi serve`.
//!
//! ```text
//! POST        /api/chat                 placeholder answer, recorded in the store
//! POST        /api/chat-ai              relayed to the LLM
//! GET|POST    /api/conversations        bearer required
//! GET|DELETE  /api/conversations/{id}   bearer required
//! ANY         /api/proxy/{*path}        forwarded to the backend service
//! GET         /api/auth/verify          bearer presence check
//! GET         /                         welcome message
//! ```

pub mod auth;
pub mod chat;
pub mod conversations;
pub mod error;
pub mod llm;
pub mod proxy;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Method, header};
use axum::routing::{any, get, post};
use axum::{Json, Router, middleware};
use log::info;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::chat::store::{ConversationStore, MemoryStore};
use crate::core::config::ResolvedConfig;
use error::method_not_allowed;
use llm::LlmSettings;

pub use error::HandlerError;

/// Shared by every handler.
pub struct ServerState {
    pub store: Arc<dyn ConversationStore>,
    pub http: reqwest::Client,
    pub backend_url: String,
    pub llm: LlmSettings,
    pub placeholder_delay: Duration,
}

impl ServerState {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: &ResolvedConfig, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            backend_url: config.backend_url.trim_end_matches('/').to_string(),
            llm: LlmSettings::from_config(config),
            placeholder_delay: Duration::from_millis(config.placeholder_delay_ms),
        }
    }
}

async fn welcome() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Polish Law for Foreigners API" }))
}

pub fn router(state: Arc<ServerState>) -> Router {
    let conversations = Router::new()
        .route(
            "/api/conversations",
            get(conversations::list)
                .post(conversations::create)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/conversations/{id}",
            get(conversations::get_one)
                .delete(conversations::delete_one)
                .fallback(method_not_allowed),
        )
        .route_layer(middleware::from_fn(auth::require_bearer));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(welcome))
        .route("/api/chat", post(chat::chat).fallback(method_not_allowed))
        .route("/api/chat-ai", post(llm::chat_ai).fallback(method_not_allowed))
        .route("/api/auth/verify", get(auth::verify).fallback(method_not_allowed))
        .route("/api/proxy", any(proxy::missing_path))
        .route("/api/proxy/{*path}", any(proxy::forward))
        .merge(conversations)
        .layer(cors)
        .with_state(state)
}

/// Binds `config.bind` and serves until the process is stopped.
pub async fn serve(config: &ResolvedConfig) -> std::io::Result<()> {
    let state = Arc::new(ServerState::from_config(config));
    if state.llm.api_key.is_none() {
        info!("OPENAI_API_KEY not set, /api/chat-ai will answer 500");
    }
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await
}
