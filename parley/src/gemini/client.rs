//! HTTP client for the Gemini API.

use async_trait::async_trait;
use serde_json::Value;

use super::types::{extract_reply, GenerateContentRequest};
use crate::error::ChatError;

/// Default API root for Gemini.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Header carrying the API key. The key never goes into the URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Something that can turn a conversation payload into a reply.
///
/// `Ok(None)` means the call succeeded but the response carried no usable text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<Option<String>, ChatError>;
}

/// Client for `models/{model}:generateContent`.
///
/// One request per call: no retries and no timeout beyond reqwest's defaults.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        }
    }

    /// `{base_url}/models/{model}:generateContent`
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<Option<String>, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;

        tracing::debug!(
            model = %self.model,
            turns = request.contents.len(),
            "Calling Gemini"
        );

        let resp = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Gemini API error");
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

        let reply = extract_reply(&body);
        if reply.is_none() {
            tracing::warn!("Gemini response had no candidate text");
        }
        Ok(reply)
    }
}
