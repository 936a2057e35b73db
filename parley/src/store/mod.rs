//! Session and message storage.
//!
//! The server only talks to [`SessionStore`]; [`MemoryStore`] is the
//! process-lifetime implementation. A persistent backend plugs in here.

mod memory;

use async_trait::async_trait;

use crate::models::{Message, NewMessage, Session};

pub use memory::MemoryStore;

/// Storage for sessions and their ordered message history.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Register a fresh session with a newly generated id.
    async fn create_session(&self) -> Session;

    /// Look up a session record.
    async fn session(&self, session_id: &str) -> Option<Session>;

    /// Store a message, assigning its id and timestamp.
    ///
    /// Creates the session if it has not been seen before.
    async fn append(&self, session_id: &str, message: NewMessage) -> Message;

    /// Messages of a session in insertion order. Empty for unknown sessions.
    async fn list(&self, session_id: &str) -> Vec<Message>;

    /// Remove all messages of a session. A no-op for unknown sessions.
    async fn clear(&self, session_id: &str);
}
