//! # Application State
//!
//! Core business state for Lexi. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── messages: Vec<Message>                  // what the chat pane shows
//! ├── active_conversation: Option<Conversation>
//! ├── conversations: Vec<Conversation>        // sidebar summaries
//! ├── is_loading: bool                        // a send is in flight
//! ├── error: String                           // last user-visible error, "" = none
//! ├── auth: AuthState                         // signed-in status + profile
//! ├── pending_login: Option<DeviceCode>       // device login awaiting approval
//! ├── pending_send: Option<PendingSend>       // where the in-flight answer belongs
//! └── status_message: String                  // header status text
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//!
//! While a conversation is active, `messages` mirrors its message list.
//! Without one, `messages` is the draft that becomes the new conversation
//! once the server assigns an id.

use crate::auth::{AuthState, DeviceCode};
use crate::chat::{Conversation, Message};

/// The view a send was made from. An answer is only shown if that view is
/// still on screen when it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingSend {
    /// Follow-up in an existing conversation.
    Conversation(String),
    /// First message of a draft, identified by the user message id.
    Draft(String),
}

#[derive(Debug, Clone, Default)]
pub struct App {
    pub messages: Vec<Message>,
    pub active_conversation: Option<Conversation>,
    pub conversations: Vec<Conversation>,
    pub is_loading: bool,
    pub error: String,
    pub auth: AuthState,
    pub pending_login: Option<DeviceCode>,
    pub pending_send: Option<PendingSend>,
    pub status_message: String,
    /// Label of the backend in use ("http", "offline").
    pub backend_name: String,
}

impl App {
    pub fn new(backend_name: impl Into<String>, auth: AuthState) -> Self {
        Self {
            backend_name: backend_name.into(),
            auth,
            ..Self::default()
        }
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_conversation.as_ref().map(|c| c.id.as_str())
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_empty()
    }

    /// Whether the sidebar lists conversations. Offline history is local,
    /// so it shows without signing in.
    pub fn show_history(&self) -> bool {
        self.auth.is_authenticated || self.backend_name == "offline"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_new_defaults() {
        let app = App::new("offline", AuthState::default());
        assert!(app.messages.is_empty());
        assert!(app.active_id().is_none());
        assert!(!app.is_loading);
        assert!(!app.has_error());
        assert_eq!(app.backend_name, "offline");
        assert!(app.pending_send.is_none());
    }

    #[test]
    fn test_history_shown_when_signed_in_or_offline() {
        assert!(App::new("offline", AuthState::default()).show_history());
        assert!(!App::new("http", AuthState::default()).show_history());
        let signed_in = AuthState {
            is_authenticated: true,
            ..AuthState::default()
        };
        assert!(App::new("http", signed_in).show_history());
    }
}
