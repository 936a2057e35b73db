//! Wire types for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Author;

/// A text fragment of a content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One turn in the request `contents` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
    /// Either `"user"` or `"model"`.
    pub role: String,
}

impl Content {
    pub fn text(author: Author, text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
            role: author.as_str().to_string(),
        }
    }

    /// Concatenated text of all parts.
    #[cfg(test)]
    pub fn joined_text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
///
/// Returns `None` for any other shape, including an empty string.
pub fn extract_reply(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .filter(|text| !text.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_gemini_field_names() {
        let request = GenerateContentRequest {
            contents: vec![Content::text(Author::User, "hi")],
            generation_config: GenerationConfig::default(),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 1024);
        assert!(json["generationConfig"].get("top_k").is_none());
    }

    #[test]
    fn extract_reply_from_candidate() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "Hello there"}], "role": "model"}}]
        });
        assert_eq!(extract_reply(&body).as_deref(), Some("Hello there"));
    }

    #[test]
    fn extract_reply_rejects_unexpected_shapes() {
        assert_eq!(extract_reply(&json!({})), None);
        assert_eq!(extract_reply(&json!({"candidates": []})), None);
        assert_eq!(extract_reply(&json!({"candidates": [{"finishReason": "SAFETY"}]})), None);
        assert_eq!(
            extract_reply(&json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]})),
            None
        );
        assert_eq!(
            extract_reply(&json!({"candidates": [{"content": {"parts": [{"text": 3}]}}]})),
            None
        );
    }
}
