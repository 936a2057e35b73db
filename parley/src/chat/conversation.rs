//! One chat turn from user message to stored model reply.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::gemini::{Content, GenerateContentRequest, GenerationConfig, ModelClient};
use crate::models::{Author, NewMessage};
use crate::store::SessionStore;

/// Reply used when the model answers with an unexpected shape.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response. Please try again later.";

/// Result of a successful chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    /// RFC 3339, millisecond precision, UTC.
    pub timestamp: String,
}

impl ChatReply {
    fn new(response: String, at: DateTime<Utc>) -> Self {
        Self {
            response,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Drives a chat turn against a store and a model.
pub struct Conversation {
    store: Arc<dyn SessionStore>,
    model: Arc<dyn ModelClient>,
    system_instruction: String,
    generation: GenerationConfig,
    history_window: usize,
    max_message_chars: usize,
}

impl Conversation {
    pub fn new(
        store: Arc<dyn SessionStore>,
        model: Arc<dyn ModelClient>,
        system_instruction: impl Into<String>,
    ) -> Self {
        Self {
            store,
            model,
            system_instruction: system_instruction.into(),
            generation: GenerationConfig::default(),
            history_window: 10,
            max_message_chars: 4000,
        }
    }

    #[must_use]
    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    #[must_use]
    pub fn with_max_message_chars(mut self, max: usize) -> Self {
        self.max_message_chars = max;
        self
    }

    /// Check the message length in Unicode scalar values.
    ///
    /// A character outside the Basic Multilingual Plane (most emoji) counts
    /// once, not as the two UTF-16 units a browser `maxlength` sees.
    pub fn validate(&self, message: &str) -> Result<(), ChatError> {
        let len = message.chars().count();
        if len == 0 {
            return Err(ChatError::InvalidRequest(vec![
                "message: must contain at least 1 character".to_string(),
            ]));
        }
        if len > self.max_message_chars {
            return Err(ChatError::InvalidRequest(vec![format!(
                "message: must contain at most {} characters",
                self.max_message_chars
            )]));
        }
        Ok(())
    }

    /// Run one turn.
    ///
    /// Any failure after validation is also stored in the session as a model
    /// message, so it shows up in the conversation.
    pub async fn send(&self, session_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        self.validate(message)?;

        match self.exchange(session_id, message).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                tracing::error!(session_id, error = %err, "Chat turn failed");
                self.store
                    .append(session_id, NewMessage::model(err.to_string()))
                    .await;
                Err(err)
            }
        }
    }

    async fn exchange(&self, session_id: &str, message: &str) -> Result<ChatReply, ChatError> {
        let stored = self.store.append(session_id, NewMessage::user(message)).await;

        let history = self.store.list(session_id).await;
        let request = self.build_request(
            history
                .iter()
                .filter(|m| m.id != stored.id)
                .map(|m| (m.author(), m.content.as_str())),
            message,
        );

        tracing::info!(
            session_id,
            history = request.contents.len() - 2,
            "Sending chat turn to model"
        );

        let reply = self
            .model
            .generate(&request)
            .await?
            .unwrap_or_else(|| FALLBACK_REPLY.to_string());

        let saved = self.store.append(session_id, NewMessage::model(reply)).await;
        Ok(ChatReply::new(saved.content, saved.timestamp))
    }

    /// System instruction, the trailing window of `history`, then `message`.
    pub fn build_request<'a, I>(&self, history: I, message: &str) -> GenerateContentRequest
    where
        I: IntoIterator<Item = (Author, &'a str)>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut window: Vec<_> = history
            .into_iter()
            .rev()
            .take(self.history_window)
            .collect();
        window.reverse();

        let mut contents = Vec::with_capacity(window.len() + 2);
        contents.push(Content::text(Author::Model, self.system_instruction.as_str()));
        contents.extend(window.into_iter().map(|(author, text)| Content::text(author, text)));
        contents.push(Content::text(Author::User, message));

        GenerateContentRequest {
            contents,
            generation_config: self.generation,
        }
    }
}
