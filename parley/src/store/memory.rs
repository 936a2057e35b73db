//! In-memory session store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::SessionStore;
use crate::models::{generate_session_id, Message, NewMessage, Session};

/// Messages belonging to one session.
struct SessionEntry {
    session: Session,
    messages: Vec<Message>,
}

impl SessionEntry {
    fn new(id: &str) -> Self {
        Self {
            session: Session::new(id.to_string()),
            messages: Vec::new(),
        }
    }
}

struct Inner {
    /// Map of session id -> entry
    sessions: HashMap<String, SessionEntry>,
    /// Next message id; shared by all sessions.
    next_message_id: u64,
}

/// Store that keeps everything in process memory until restart.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                sessions: HashMap::new(),
                next_message_id: 1,
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self) -> Session {
        let mut inner = self.inner.write().await;

        let mut id = generate_session_id();
        while inner.sessions.contains_key(&id) {
            id = generate_session_id();
        }

        let entry = SessionEntry::new(&id);
        let session = entry.session.clone();
        inner.sessions.insert(id, entry);

        tracing::debug!(session_id = %session.id, "Created session");
        session
    }

    async fn session(&self, session_id: &str) -> Option<Session> {
        let inner = self.inner.read().await;
        inner.sessions.get(session_id).map(|e| e.session.clone())
    }

    async fn append(&self, session_id: &str, message: NewMessage) -> Message {
        let mut inner = self.inner.write().await;

        let id = inner.next_message_id;
        inner.next_message_id += 1;

        let entry = inner
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry::new(session_id));

        // Clamp so a wall clock stepping backwards cannot reorder history
        let mut timestamp = Utc::now();
        if let Some(last) = entry.messages.last() {
            timestamp = timestamp.max(last.timestamp);
        }

        let stored = Message {
            id,
            content: message.content,
            is_user: message.author.is_user(),
            timestamp,
        };
        entry.messages.push(stored.clone());
        stored
    }

    async fn list(&self, session_id: &str) -> Vec<Message> {
        let inner = self.inner.read().await;
        inner
            .sessions
            .get(session_id)
            .map(|e| e.messages.clone())
            .unwrap_or_default()
    }

    async fn clear(&self, session_id: &str) {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.sessions.get_mut(session_id) {
            entry.messages.clear();
        }
    }
}
