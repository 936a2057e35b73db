//! Parley HTTP server.
//!
//! Architecture:
//! - One in-memory store per process, injected into every handler via state
//! - Chat turns go through [`Conversation`], which owns the model client
//! - Nothing survives a restart
//!
//! Endpoints:
//! - GET /api/messages?sessionId= - Messages of a session, oldest first
//! - POST /api/sessions - Create a session
//! - POST /api/chat?sessionId= - Send a message, get the model reply
//! - DELETE /api/chat/reset?sessionId= - Clear a session's history
//! - GET /health - Liveness probe
//! - GET / - Chat UI

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Html,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::chat::{ChatReply, Conversation};
use crate::config::Config;
use crate::error::ChatError;
use crate::gemini::GeminiClient;
use crate::models::{Message, Session};
use crate::store::{MemoryStore, SessionStore};

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Session and message storage.
    pub store: Arc<dyn SessionStore>,
    /// Chat turn driver (shares `store`).
    pub conversation: Arc<Conversation>,
}

impl AppState {
    /// Wire the production store and Gemini client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::new());

        let client = GeminiClient::new(
            &config.gemini.base_url,
            &config.gemini.model,
            config.gemini.resolve_api_key(),
        );
        if !client.has_api_key() {
            tracing::warn!("No Gemini API key configured; chat requests will fail");
        }

        let instruction = config.chat.load_system_instruction()?;
        let conversation = Conversation::new(store.clone(), Arc::new(client), instruction)
            .with_generation_config(config.gemini.generation_config())
            .with_history_window(config.chat.history_window)
            .with_max_message_chars(config.chat.max_message_chars);

        Ok(Self {
            store,
            conversation: Arc::new(conversation),
        })
    }
}

// === Request/Response Types ===

/// `?sessionId=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

impl SessionQuery {
    /// The session id, treating an empty value as absent.
    fn id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    fn require(&self) -> Result<&str, ChatError> {
        self.id().ok_or(ChatError::MissingSessionId)
    }
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Plain `{ "message": ... }` acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}

// === Server Lifecycle ===

/// Build the router. Tests drive it directly with `oneshot`.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/api/messages", get(get_messages))
        .route("/api/sessions", post(create_session))
        .route("/api/chat", post(chat))
        .route("/api/chat/reset", delete(reset_chat))
        .route("/health", get(health));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.route("/", get(index_handler)),
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server and block until Ctrl-C.
pub async fn start_server(config: Config, open_browser: bool) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let app = build_router(state, config.server.static_dir.as_deref());

    let (listener, addr) = bind(&config.server.host, config.server.port).await?;
    tracing::info!("Parley server listening on http://{addr}");

    if open_browser {
        if let Err(e) = open::that(format!("http://{addr}")) {
            tracing::warn!(error = %e, "Could not open browser");
        }
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Bind a hostname or IP literal.
async fn bind(host: &str, port: u16) -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let addr = listener.local_addr().context("Failed to read listen address")?;
    Ok((listener, addr))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
}

// === Handlers ===

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

async fn get_messages(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> Json<Vec<Message>> {
    let Some(session_id) = params.id() else {
        return Json(Vec::new());
    };
    Json(state.store.list(session_id).await)
}

async fn create_session(State(state): State<AppState>) -> Json<Session> {
    Json(state.store.create_session().await)
}

async fn chat(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ChatError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected chat body");
        ChatError::InvalidRequest(vec![rejection.body_text()])
    })?;
    state.conversation.validate(&req.message)?;
    let session_id = params.require()?;

    let reply = state.conversation.send(session_id, &req.message).await?;
    Ok(Json(reply))
}

async fn reset_chat(
    State(state): State<AppState>,
    Query(params): Query<SessionQuery>,
) -> Result<Json<StatusMessage>, ChatError> {
    let session_id = params.require()?;
    state.store.clear(session_id).await;
    tracing::info!(session_id, "Chat reset");

    Ok(Json(StatusMessage {
        message: "Chat reset successfully".to_string(),
    }))
}
