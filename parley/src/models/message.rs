//! Message model representing one turn in a chat session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    /// Message typed by the user.
    User,
    /// Reply produced by the model (or an error shown in its place).
    Model,
}

impl Author {
    /// Role string used in the Gemini `contents` array.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }

    pub const fn is_user(self) -> bool {
        matches!(self, Self::User)
    }

    pub const fn from_is_user(is_user: bool) -> Self {
        if is_user {
            Self::User
        } else {
            Self::Model
        }
    }
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored chat message.
///
/// Immutable once the store has assigned its id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Process-wide monotonic identifier (assigned by the store).
    pub id: u64,
    /// Text of the message.
    pub content: String,
    /// Whether the user wrote this message.
    pub is_user: bool,
    /// When the message was stored.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub const fn author(&self) -> Author {
        Author::from_is_user(self.is_user)
    }
}

/// A message that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub content: String,
    pub author: Author,
}

impl NewMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: Author::User,
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            author: Author::Model,
        }
    }
}
