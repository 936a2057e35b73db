//! Session model representing one conversation thread.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest session id handed out by [`generate_session_id`].
pub const SESSION_ID_MIN: u32 = 1;
/// Largest session id handed out by [`generate_session_id`].
pub const SESSION_ID_MAX: u32 = 10_000_000;

/// A session groups the messages of one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Client-chosen identifier (a random number rendered as a string).
    pub id: String,
    /// When the session was first seen.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session.
    pub fn new(id: String) -> Self {
        Self {
            id,
            created_at: Utc::now(),
        }
    }
}

/// Generate a random session id in `[1, 10_000_000]`, the same range the browser client uses.
pub fn generate_session_id() -> String {
    rand::random_range(SESSION_ID_MIN..=SESSION_ID_MAX).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_in_range() {
        for _ in 0..1000 {
            let id: u32 = generate_session_id().parse().unwrap();
            assert!((SESSION_ID_MIN..=SESSION_ID_MAX).contains(&id));
        }
    }
}
