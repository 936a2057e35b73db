//! Conversation orchestration: store, window, call the model, store the reply.

mod conversation;

pub use conversation::{ChatReply, Conversation};
