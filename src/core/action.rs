//! # Actions
//!
//! Everything that can happen in Lexi becomes an `Action`.
//! User presses Enter? That's `Action::Submit(text)`.
//! Server answers? That's `Action::MessageSent(response)`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` describing the I/O to perform next.
//! No side effects here. I/O happens in `controller::run_effect`.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info};

use crate::auth::{AuthState, DeviceCode};
use crate::chat::backend::{DELETE_FALLBACK, LOAD_FALLBACK, SEND_FALLBACK};
use crate::chat::{ApiError, ChatResponse, Conversation, Message};
use crate::core::state::{App, PendingSend};

#[derive(Debug, Clone)]
pub enum Action {
    /// User submitted the composer text.
    Submit(String),
    MessageSent(ChatResponse),
    SendFailed(ApiError),

    RefreshConversations,
    ConversationsLoaded(Vec<Conversation>),

    SelectConversation(String),
    ConversationLoaded(Conversation),
    ConversationLoadFailed(ApiError),

    NewConversation,

    DeleteConversation(String),
    ConversationDeleted(String),
    DeleteFailed(ApiError),

    Login,
    LoginStarted(DeviceCode),
    LoginFailed(String),
    AuthChanged(AuthState),
    Logout,

    DismissError,
    Quit,
}

/// I/O requested by `update()`. Performed outside the reducer.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    SendMessage {
        text: String,
        conversation_id: Option<String>,
    },
    FetchConversations,
    FetchConversation(String),
    DeleteConversation(String),
    StartLogin,
    AwaitLogin(DeviceCode),
    Logout,
}

/// Drops the active conversation and everything shown for it.
fn reset_conversation(app: &mut App) {
    app.active_conversation = None;
    app.messages.clear();
    app.error.clear();
}

pub fn update(app: &mut App, action: Action) -> Effect {
    match action {
        Action::Submit(text) => {
            if text.trim().is_empty() || app.is_loading {
                debug!("Ignoring submit (empty={}, loading={})", text.trim().is_empty(), app.is_loading);
                return Effect::None;
            }
            let message = Message::user(text.clone());
            app.pending_send = Some(match app.active_id() {
                Some(id) => PendingSend::Conversation(id.to_string()),
                None => PendingSend::Draft(message.id.clone()),
            });
            app.messages.push(message.clone());
            if let Some(active) = app.active_conversation.as_mut() {
                active.messages.push(message);
            }
            app.error.clear();
            app.is_loading = true;
            app.status_message = "Thinking...".to_string();
            Effect::SendMessage {
                text,
                conversation_id: app.active_id().map(str::to_string),
            }
        }
        Action::MessageSent(response) => {
            app.is_loading = false;
            app.status_message.clear();
            let conversation_id = response.conversation_id.clone();
            let still_open = match app.pending_send.take() {
                Some(PendingSend::Conversation(id)) => {
                    id == conversation_id && app.active_id() == Some(id.as_str())
                }
                Some(PendingSend::Draft(message_id)) => {
                    app.active_conversation.is_none()
                        && app.messages.iter().any(|m| m.id == message_id)
                }
                None => false,
            };
            if !still_open {
                info!(
                    "Answer for {} arrived after its view was left; leaving it to the refresh",
                    conversation_id
                );
                return Effect::FetchConversations;
            }
            let answer = response.into_assistant_message();
            app.messages.push(answer.clone());
            match app.active_conversation.as_mut() {
                Some(active) => active.messages.push(answer),
                None => {
                    app.active_conversation =
                        Some(Conversation::new(conversation_id, app.messages.clone()));
                }
            }
            Effect::FetchConversations
        }
        Action::SendFailed(err) => {
            // The optimistic user message stays so the user can see what failed.
            app.is_loading = false;
            app.pending_send = None;
            app.status_message.clear();
            app.error = err.user_message_or(SEND_FALLBACK);
            Effect::None
        }
        Action::RefreshConversations => Effect::FetchConversations,
        Action::ConversationsLoaded(list) => {
            app.conversations = list;
            Effect::None
        }
        Action::SelectConversation(id) => {
            app.status_message = "Loading conversation...".to_string();
            Effect::FetchConversation(id)
        }
        Action::ConversationLoaded(conversation) => {
            app.status_message.clear();
            app.messages = conversation.messages.clone();
            app.active_conversation = Some(conversation);
            app.error.clear();
            Effect::None
        }
        Action::ConversationLoadFailed(err) => {
            app.status_message.clear();
            app.error = err.user_message_or(LOAD_FALLBACK);
            Effect::None
        }
        Action::NewConversation => {
            reset_conversation(app);
            Effect::None
        }
        Action::DeleteConversation(id) => Effect::DeleteConversation(id),
        Action::ConversationDeleted(id) => {
            if app.active_id() == Some(id.as_str()) {
                reset_conversation(app);
            }
            app.conversations.retain(|c| c.id != id);
            Effect::FetchConversations
        }
        Action::DeleteFailed(err) => {
            app.error = err.user_message_or(DELETE_FALLBACK);
            Effect::None
        }
        Action::Login => {
            if app.auth.is_authenticated || app.auth.is_loading {
                return Effect::None;
            }
            app.auth.is_loading = true;
            app.status_message = "Starting sign-in...".to_string();
            Effect::StartLogin
        }
        Action::LoginStarted(code) => {
            app.status_message = format!("Open {} and enter code {}", code.url(), code.user_code);
            app.pending_login = Some(code.clone());
            Effect::AwaitLogin(code)
        }
        Action::LoginFailed(reason) => {
            app.pending_login = None;
            app.auth.is_loading = false;
            app.status_message.clear();
            app.error = reason;
            Effect::None
        }
        Action::AuthChanged(auth) => {
            app.pending_login = None;
            app.status_message.clear();
            let signed_in = auth.is_authenticated;
            app.auth = auth;
            if signed_in {
                Effect::FetchConversations
            } else {
                app.conversations.clear();
                reset_conversation(app);
                Effect::None
            }
        }
        Action::Logout => Effect::Logout,
        Action::DismissError => {
            app.error.clear();
            Effect::None
        }
        Action::Quit => Effect::Quit,
    }
}
