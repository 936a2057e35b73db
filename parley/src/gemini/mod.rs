//! Gemini `generateContent` client.

mod client;
mod types;

pub use client::{GeminiClient, ModelClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use types::{Content, GenerateContentRequest, GenerationConfig};
