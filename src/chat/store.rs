//! Conversation repository.
//!
//! [`ConversationStore`] is the seam a real database would sit behind;
//! [`MemoryStore`] keeps everything in process and forgets it on exit.
//! Conversations belong to an owner key and are invisible to other owners.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::RwLock;

use super::types::{Conversation, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    NotFound,
    /// The conversation exists but belongs to someone else.
    Forbidden,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "Conversation not found"),
            StoreError::Forbidden => write!(f, "Not authorized to access this conversation"),
        }
    }
}

impl std::error::Error for StoreError {}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// The owner's conversations, most recently updated first.
    async fn list(&self, owner: &str) -> Vec<Conversation>;

    /// Creates an empty conversation.
    async fn create(&self, owner: &str) -> Conversation;

    async fn get(&self, owner: &str, id: &str) -> Result<Conversation, StoreError>;

    /// Appends messages to conversation `id`, or to a new conversation when
    /// `id` is `None`. Bumps `updated_at`.
    async fn append(
        &self,
        owner: &str,
        id: Option<&str>,
        messages: Vec<Message>,
    ) -> Result<Conversation, StoreError>;

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError>;
}

struct Entry {
    owner: String,
    conversation: Conversation,
}

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_owner(entry: Option<&Entry>, owner: &str) -> Result<(), StoreError> {
    match entry {
        None => Err(StoreError::NotFound),
        Some(e) if e.owner != owner => Err(StoreError::Forbidden),
        Some(_) => Ok(()),
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list(&self, owner: &str) -> Vec<Conversation> {
        let entries = self.entries.read().await;
        let mut list: Vec<Conversation> = entries
            .values()
            .filter(|e| e.owner == owner)
            .map(|e| e.conversation.clone())
            .collect();
        list.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        list
    }

    async fn create(&self, owner: &str) -> Conversation {
        let conversation = Conversation::new(uuid::Uuid::new_v4().to_string(), Vec::new());
        debug!("Created conversation {}", conversation.id);
        self.entries.write().await.insert(
            conversation.id.clone(),
            Entry {
                owner: owner.to_string(),
                conversation: conversation.clone(),
            },
        );
        conversation
    }

    async fn get(&self, owner: &str, id: &str) -> Result<Conversation, StoreError> {
        let entries = self.entries.read().await;
        let entry = entries.get(id);
        check_owner(entry, owner)?;
        entry
            .map(|e| e.conversation.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn append(
        &self,
        owner: &str,
        id: Option<&str>,
        messages: Vec<Message>,
    ) -> Result<Conversation, StoreError> {
        let mut entries = self.entries.write().await;
        let key = match id {
            Some(id) => {
                check_owner(entries.get(id), owner)?;
                id.to_string()
            }
            None => {
                let conversation = Conversation::new(uuid::Uuid::new_v4().to_string(), Vec::new());
                let key = conversation.id.clone();
                entries.insert(
                    key.clone(),
                    Entry {
                        owner: owner.to_string(),
                        conversation,
                    },
                );
                key
            }
        };
        let entry = entries.get_mut(&key).ok_or(StoreError::NotFound)?;
        entry.conversation.messages.extend(messages);
        entry.conversation.updated_at = Utc::now();
        Ok(entry.conversation.clone())
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        check_owner(entries.get(id), owner)?;
        entries.remove(id);
        debug!("Deleted conversation {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_without_id_creates_conversation() {
        let store = MemoryStore::new();
        let conv = store
            .append("alice", None, vec![Message::user("hi")])
            .await
            .unwrap();
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(store.get("alice", &conv.id).await.unwrap(), conv);
    }

    #[tokio::test]
    async fn test_append_to_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let err = store.append("alice", Some("nope"), vec![]).await.unwrap_err();
        assert_eq!(err, StoreError::NotFound);
    }

    #[tokio::test]
    async fn test_other_owner_is_forbidden() {
        let store = MemoryStore::new();
        let conv = store.create("alice").await;
        assert_eq!(store.get("bob", &conv.id).await, Err(StoreError::Forbidden));
        assert_eq!(store.delete("bob", &conv.id).await, Err(StoreError::Forbidden));
        assert!(store.list("bob").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let store = MemoryStore::new();
        let older = store.create("alice").await;
        let newer = store.create("alice").await;
        store
            .append("alice", Some(&older.id), vec![Message::user("bump")])
            .await
            .unwrap();
        let ids: Vec<String> = store.list("alice").await.into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let store = MemoryStore::new();
        let conv = store.create("alice").await;
        store.delete("alice", &conv.id).await.unwrap();
        assert_eq!(store.get("alice", &conv.id).await, Err(StoreError::NotFound));
        assert_eq!(store.delete("alice", &conv.id).await, Err(StoreError::NotFound));
    }
}
