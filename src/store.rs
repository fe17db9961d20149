use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Chat, Document, Message};

/// Storage port for chats, messages and documents. The pipeline depends on
/// this trait only, never on a concrete container, so tests can inject their
/// own implementation. Cascading deletes are a sequence of independent
/// operations with no cross-entity atomicity.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn insert_chat(&self, chat: Chat) -> Result<()>;
    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>>;
    /// All chats, most recently updated first.
    async fn list_chats(&self) -> Result<Vec<Chat>>;
    async fn touch_chat(&self, chat_id: &str, at: DateTime<Utc>) -> Result<()>;
    /// Returns false when the chat did not exist.
    async fn delete_chat(&self, chat_id: &str) -> Result<bool>;

    async fn insert_message(&self, message: Message) -> Result<()>;
    /// Messages of one chat in chronological order. Unknown chat ids yield
    /// an empty list rather than an error.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>>;
    async fn delete_chat_messages(&self, chat_id: &str) -> Result<()>;

    async fn insert_document(&self, document: Document) -> Result<()>;
    /// Documents of one chat, most recent upload first.
    async fn list_documents(&self, chat_id: &str) -> Result<Vec<Document>>;
    async fn delete_chat_documents(&self, chat_id: &str) -> Result<()>;
}

/// Transient in-memory store. Data is lost on restart; durability is out of
/// scope for this service.
#[derive(Clone, Default)]
pub struct MemoryStore {
    chats: Arc<Mutex<HashMap<String, Chat>>>,
    messages: Arc<Mutex<HashMap<String, Message>>>,
    documents: Arc<Mutex<HashMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| anyhow::anyhow!("lock poisoned"))
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn insert_chat(&self, chat: Chat) -> Result<()> {
        lock(&self.chats)?.insert(chat.id.clone(), chat);
        Ok(())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<Option<Chat>> {
        Ok(lock(&self.chats)?.get(chat_id).cloned())
    }

    async fn list_chats(&self) -> Result<Vec<Chat>> {
        let mut chats: Vec<Chat> = lock(&self.chats)?.values().cloned().collect();
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(chats)
    }

    async fn touch_chat(&self, chat_id: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(chat) = lock(&self.chats)?.get_mut(chat_id) {
            // updated_at never moves backwards.
            if at > chat.updated_at {
                chat.updated_at = at;
            }
        }
        Ok(())
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<bool> {
        Ok(lock(&self.chats)?.remove(chat_id).is_some())
    }

    async fn insert_message(&self, message: Message) -> Result<()> {
        lock(&self.messages)?.insert(message.id.clone(), message);
        Ok(())
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = lock(&self.messages)?
            .values()
            .filter(|message| message.chat_id == chat_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn delete_chat_messages(&self, chat_id: &str) -> Result<()> {
        lock(&self.messages)?.retain(|_, message| message.chat_id != chat_id);
        Ok(())
    }

    async fn insert_document(&self, document: Document) -> Result<()> {
        lock(&self.documents)?.insert(document.id.clone(), document);
        Ok(())
    }

    async fn list_documents(&self, chat_id: &str) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = lock(&self.documents)?
            .values()
            .filter(|document| document.chat_id == chat_id)
            .cloned()
            .collect();
        documents.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(documents)
    }

    async fn delete_chat_documents(&self, chat_id: &str) -> Result<()> {
        lock(&self.documents)?.retain(|_, document| document.chat_id != chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;
    use uuid::Uuid;

    fn make_chat(title: &str) -> Chat {
        let now = Utc::now();
        Chat {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            curriculum: "CBSE".to_string(),
            language: "English".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn make_message(chat_id: &str, role: Role, content: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            role,
            content: content.to_string(),
            metadata: None,
            created_at: at,
        }
    }

    fn make_document(chat_id: &str, name: &str, at: DateTime<Utc>) -> Document {
        Document {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            filename: name.to_string(),
            original_name: name.to_string(),
            mime_type: "text/plain".to_string(),
            size: "0".to_string(),
            extracted_text: String::new(),
            questions: vec![],
            uploaded_at: at,
        }
    }

    #[tokio::test]
    async fn chats_list_most_recently_updated_first() {
        let store = MemoryStore::new();
        let older = make_chat("older");
        let newer = make_chat("newer");
        store.insert_chat(older.clone()).await.unwrap();
        store.insert_chat(newer.clone()).await.unwrap();
        store
            .touch_chat(&newer.id, Utc::now() + Duration::seconds(5))
            .await
            .unwrap();

        let chats = store.list_chats().await.unwrap();
        assert_eq!(chats[0].id, newer.id);
        assert_eq!(chats[1].id, older.id);
    }

    #[tokio::test]
    async fn touch_never_moves_updated_at_backwards() {
        let store = MemoryStore::new();
        let chat = make_chat("chat");
        store.insert_chat(chat.clone()).await.unwrap();
        store
            .touch_chat(&chat.id, chat.updated_at - Duration::seconds(60))
            .await
            .unwrap();

        let stored = store.get_chat(&chat.id).await.unwrap().unwrap();
        assert_eq!(stored.updated_at, chat.updated_at);
    }

    #[tokio::test]
    async fn messages_come_back_in_chronological_order() {
        let store = MemoryStore::new();
        let chat = make_chat("chat");
        let base = Utc::now();
        store
            .insert_message(make_message(
                &chat.id,
                Role::Assistant,
                "second",
                base + Duration::seconds(1),
            ))
            .await
            .unwrap();
        store
            .insert_message(make_message(&chat.id, Role::User, "first", base))
            .await
            .unwrap();

        let messages = store.list_messages(&chat.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].content, "second");
    }

    #[tokio::test]
    async fn cascade_delete_removes_every_related_record() {
        let store = MemoryStore::new();
        let chat = make_chat("doomed");
        let other = make_chat("survivor");
        store.insert_chat(chat.clone()).await.unwrap();
        store.insert_chat(other.clone()).await.unwrap();

        let now = Utc::now();
        store
            .insert_message(make_message(&chat.id, Role::User, "hi", now))
            .await
            .unwrap();
        store
            .insert_message(make_message(
                &chat.id,
                Role::Assistant,
                "hello",
                now + Duration::seconds(1),
            ))
            .await
            .unwrap();
        store
            .insert_document(make_document(&chat.id, "book.txt", now))
            .await
            .unwrap();
        store
            .insert_message(make_message(&other.id, Role::User, "keep me", now))
            .await
            .unwrap();

        assert!(store.delete_chat(&chat.id).await.unwrap());
        store.delete_chat_messages(&chat.id).await.unwrap();
        store.delete_chat_documents(&chat.id).await.unwrap();

        assert!(store.get_chat(&chat.id).await.unwrap().is_none());
        assert!(store.list_messages(&chat.id).await.unwrap().is_empty());
        assert!(store.list_documents(&chat.id).await.unwrap().is_empty());
        assert_eq!(store.list_messages(&other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn deleting_missing_chat_reports_absence() {
        let store = MemoryStore::new();
        assert!(!store.delete_chat("no-such-id").await.unwrap());
    }
}
