//! # Controller
//!
//! Executes the effects `update()` asks for and feeds the outcome back in as
//! the next action. The TUI runs effects on spawned tasks; `Controller`
//! runs them inline, which is what headless callers and tests want.

use std::sync::Arc;

use log::{debug, info};

use crate::auth::AuthAdapter;
use crate::chat::ChatBackend;
use crate::core::action::{Action, Effect, update};
use crate::core::state::App;

/// Performs one effect. Returns the action describing its outcome, or
/// `None` for effects that need no follow-up.
pub async fn run_effect(
    effect: Effect,
    backend: &dyn ChatBackend,
    auth: &dyn AuthAdapter,
) -> Option<Action> {
    match effect {
        Effect::None | Effect::Quit => None,
        Effect::SendMessage {
            text,
            conversation_id,
        } => Some(
            match backend
                .send_message(&text, conversation_id.as_deref())
                .await
            {
                Ok(response) => Action::MessageSent(response),
                Err(e) => Action::SendFailed(e),
            },
        ),
        Effect::FetchConversations => Some(Action::ConversationsLoaded(
            backend.list_conversations().await,
        )),
        Effect::FetchConversation(id) => Some(match backend.get_conversation(&id).await {
            Ok(conversation) => Action::ConversationLoaded(conversation),
            Err(e) => Action::ConversationLoadFailed(e),
        }),
        Effect::DeleteConversation(id) => Some(match backend.delete_conversation(&id).await {
            Ok(ack) => {
                info!("{} ({})", ack.message, id);
                Action::ConversationDeleted(id)
            }
            Err(e) => Action::DeleteFailed(e),
        }),
        Effect::StartLogin => Some(match auth.start_login().await {
            Ok(code) => Action::LoginStarted(code),
            Err(e) => Action::LoginFailed(e.to_string()),
        }),
        Effect::AwaitLogin(code) => Some(match auth.complete_login(&code).await {
            Ok(state) => Action::AuthChanged(state),
            Err(e) => Action::LoginFailed(e.to_string()),
        }),
        Effect::Logout => {
            auth.logout().await;
            Some(Action::AuthChanged(auth.state()))
        }
    }
}

/// Owns the state and drives actions to completion.
pub struct Controller {
    pub app: App,
    backend: Arc<dyn ChatBackend>,
    auth: Arc<dyn AuthAdapter>,
}

impl Controller {
    pub fn new(backend: Arc<dyn ChatBackend>, auth: Arc<dyn AuthAdapter>) -> Self {
        let app = App::new(backend.name(), auth.state());
        Self { app, backend, auth }
    }

    /// Applies `action` and every follow-up it triggers. Returns `Effect::Quit`
    /// if the chain asked to quit, `Effect::None` otherwise.
    pub async fn dispatch(&mut self, action: Action) -> Effect {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            debug!("Dispatch: {:?}", action);
            let effect = update(&mut self.app, action);
            if effect == Effect::Quit {
                return Effect::Quit;
            }
            next = run_effect(effect, self.backend.as_ref(), self.auth.as_ref()).await;
        }
        Effect::None
    }

    pub async fn submit(&mut self, text: impl Into<String>) {
        self.dispatch(Action::Submit(text.into())).await;
    }

    pub async fn refresh_conversations(&mut self) {
        self.dispatch(Action::RefreshConversations).await;
    }

    pub async fn select_conversation(&mut self, id: impl Into<String>) {
        self.dispatch(Action::SelectConversation(id.into())).await;
    }

    pub async fn create_new_conversation(&mut self) {
        self.dispatch(Action::NewConversation).await;
    }

    pub async fn delete_conversation(&mut self, id: impl Into<String>) {
        self.dispatch(Action::DeleteConversation(id.into())).await;
    }

    pub async fn login(&mut self) {
        self.dispatch(Action::Login).await;
    }

    pub async fn logout(&mut self) {
        self.dispatch(Action::Logout).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{ApiError, Conversation, Message};
    use crate::test_support::{FakeAuth, FakeBackend};

    fn controller(backend: FakeBackend) -> (Controller, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let controller = Controller::new(backend.clone(), Arc::new(FakeAuth::signed_in()));
        (controller, backend)
    }

    #[tokio::test]
    async fn test_blank_submit_never_reaches_backend() {
        let (mut controller, backend) = controller(FakeBackend::new());
        controller.submit("  ").await;
        assert!(backend.calls().is_empty());
        assert!(controller.app.messages.is_empty());
    }

    #[tokio::test]
    async fn test_first_send_establishes_conversation() {
        let (mut controller, backend) = controller(FakeBackend::new().reply("c-1", "Answer"));
        controller.submit("hello").await;

        let app = &controller.app;
        assert_eq!(app.messages.len(), 2);
        assert_eq!(app.messages[0].content, "hello");
        assert_eq!(app.messages[1].content, "Answer");
        assert_eq!(app.active_id(), Some("c-1"));
        assert!(!app.is_loading);
        assert_eq!(backend.calls(), vec!["send:hello:-", "list"]);
    }

    #[tokio::test]
    async fn test_follow_up_carries_conversation_id() {
        let (mut controller, backend) = controller(
            FakeBackend::new()
                .reply("c-1", "First")
                .reply("c-1", "Second"),
        );
        controller.submit("one").await;
        controller.submit("two").await;
        assert_eq!(controller.app.messages.len(), 4);
        assert!(backend.calls().contains(&"send:two:c-1".to_string()));
        assert_eq!(
            controller.app.active_conversation.as_ref().map(|c| c.messages.len()),
            Some(4)
        );
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_message() {
        let (mut controller, _) = controller(FakeBackend::new().fail_send(ApiError::Status {
            status: 500,
            message: "upstream down".into(),
        }));
        controller.submit("hello").await;
        let app = &controller.app;
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.error, "upstream down");
        assert!(!app.is_loading);
    }

    #[tokio::test]
    async fn test_select_twice_is_idempotent() {
        let conversation = Conversation::new(
            "c-9",
            vec![Message::user("q"), Message::assistant("a", Vec::new())],
        );
        let (mut controller, _) = controller(FakeBackend::new().with_conversation(conversation));
        controller.select_conversation("c-9").await;
        let first = controller.app.messages.clone();
        controller.select_conversation("c-9").await;
        assert_eq!(controller.app.messages, first);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_select_missing_sets_error_and_keeps_state() {
        let (mut controller, _) = controller(FakeBackend::new().reply("c-1", "Answer"));
        controller.submit("hello").await;
        controller.select_conversation("nope").await;
        assert_eq!(controller.app.error, "Conversation not found");
        assert_eq!(controller.app.active_id(), Some("c-1"));
        assert_eq!(controller.app.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_active_matches_new_conversation() {
        let (mut controller, backend) = controller(FakeBackend::new().reply("c-1", "Answer"));
        controller.submit("hello").await;
        controller.delete_conversation("c-1").await;

        let deleted = controller.app.clone();
        controller.create_new_conversation().await;
        assert_eq!(deleted.active_id(), None);
        assert!(deleted.messages.is_empty());
        assert!(deleted.error.is_empty());
        assert_eq!(deleted.messages, controller.app.messages);
        assert!(backend.calls().contains(&"delete:c-1".to_string()));
    }

    #[tokio::test]
    async fn test_delete_failure_sets_error() {
        let backend = FakeBackend::new();
        *backend.delete_error.lock().unwrap() = Some(ApiError::Network("refused".into()));
        let (mut controller, _) = controller(backend);
        controller.delete_conversation("c-1").await;
        assert_eq!(controller.app.error, "Failed to delete conversation");
    }

    #[tokio::test]
    async fn test_login_flow_refreshes_list() {
        let backend = Arc::new(FakeBackend::new());
        let auth = Arc::new(FakeAuth::default());
        let mut controller = Controller::new(backend.clone(), auth);
        assert!(!controller.app.auth.is_authenticated);

        controller.login().await;
        assert!(controller.app.auth.is_authenticated);
        assert!(controller.app.pending_login.is_none());
        assert_eq!(backend.calls(), vec!["list"]);

        controller.logout().await;
        assert!(!controller.app.auth.is_authenticated);
        assert!(controller.app.conversations.is_empty());
    }
}
