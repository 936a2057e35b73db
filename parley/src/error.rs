//! Error types for the chat service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Errors raised while handling a chat request.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid request data")]
    InvalidRequest(Vec<String>),

    #[error("Session ID is required")]
    MissingSessionId,

    #[error("Gemini API key not found. Set GEMINI_API_KEY or api_key in the config file.")]
    MissingApiKey,

    #[error("Gemini API error: {status} {body}")]
    Upstream { status: u16, body: String },

    #[error("Gemini API request failed: {0}")]
    Transport(String),

    #[error("Gemini API returned malformed JSON: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    /// Validation errors are the caller's fault and never reach the model.
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::MissingSessionId)
    }

    pub const fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// The URL is dropped: request URLs may carry credentials and the message
/// ends up in chat history.
impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.without_url().to_string())
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::InvalidRequest(errors) => serde_json::json!({
                "message": self.to_string(),
                "errors": errors,
            }),
            _ => serde_json::json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_display() {
        let err = ChatError::Upstream {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Gemini API error: 500 boom");
    }

    #[test]
    fn validation_errors_are_bad_request() {
        let response = ChatError::InvalidRequest(vec!["message: too long".into()]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ChatError::MissingSessionId.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn downstream_errors_are_internal() {
        assert_eq!(ChatError::MissingApiKey.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ChatError::MalformedResponse("eof".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
