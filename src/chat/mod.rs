//! # Chat
//!
//! Conversation data types and the client side of the conversation API.
//!
//! - [`types`]: `Message`, `Conversation`, request/response bodies
//! - [`backend`]: the `ChatBackend` trait and `ApiError`
//! - [`http`]: `HttpChatClient`, the REST implementation
//! - [`mock`]: `MockBackend`, an offline implementation
//! - [`store`]: the conversation repository shared with the server

pub mod backend;
pub mod http;
pub mod mock;
pub mod store;
pub mod types;

pub use backend::{ApiError, ChatBackend};
pub use http::HttpChatClient;
pub use mock::MockBackend;
pub use types::{ChatRequest, ChatResponse, Conversation, DeleteAck, Message, Role, SourceRef};
