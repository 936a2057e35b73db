//! Data models for chat entities.

mod message;
mod session;

pub use message::{Author, Message, NewMessage};
pub use session::{generate_session_id, Session};
