//! CLI command execution.
//!
//! `serve` runs the server in-process; every other command is a thin
//! client that talks to a running server over HTTP.

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::chat::ChatReply;
use crate::config::Config;
use crate::models::{Author, Message, Session};
use crate::server::{self, StatusMessage};
use crate::session::{detect_session_id, save_session_id};

use super::args::{Cli, Commands, Target};

// === HTTP Client for Server Communication ===

/// Thin client for the parley HTTP API.
struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str, session_id: Option<&str>) -> String {
        match session_id {
            Some(id) => format!(
                "{}{path}?sessionId={}",
                self.base_url,
                urlencoding::encode(id)
            ),
            None => format!("{}{path}", self.base_url),
        }
    }

    async fn chat(&self, session_id: &str, message: &str) -> Result<ChatReply> {
        let body = serde_json::json!({ "message": message });
        let resp = self
            .http
            .post(self.url("/api/chat", Some(session_id)))
            .json(&body)
            .send()
            .await
            .context("Failed to send message to server")?;
        read_json(resp).await
    }

    async fn messages(&self, session_id: &str) -> Result<Vec<Message>> {
        let resp = self
            .http
            .get(self.url("/api/messages", Some(session_id)))
            .send()
            .await
            .context("Failed to get messages from server")?;
        read_json(resp).await
    }

    async fn reset(&self, session_id: &str) -> Result<StatusMessage> {
        let resp = self
            .http
            .delete(self.url("/api/chat/reset", Some(session_id)))
            .send()
            .await
            .context("Failed to reset chat on server")?;
        read_json(resp).await
    }

    async fn create_session(&self) -> Result<Session> {
        let resp = self
            .http
            .post(self.url("/api/sessions", None))
            .send()
            .await
            .context("Failed to create session on server")?;
        read_json(resp).await
    }
}

/// Decode a success body, or turn the server's `{message}` into an error.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StatusMessage>(&text)
            .map(|m| m.message)
            .unwrap_or(text);
        bail!("Server returned {status}: {message}");
    }

    resp.json().await.context("Failed to parse server response")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_message(message: &Message) {
    let who = match message.author() {
        Author::User => "you",
        Author::Model => "model",
    };
    let at = message.timestamp.with_timezone(&Local).format("%H:%M:%S");
    println!("[{at}] {who}: {}", message.content);
}

// === Command Execution ===

pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            open,
        } => {
            let mut config = Config::load(config.as_deref()).context("Failed to load configuration")?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            server::start_server(config, open).await
        }
        Commands::Send { target, message } => send(&target, &message.join(" ")).await,
        Commands::History { target } => history(&target).await,
        Commands::Reset { target } => reset(&target).await,
        Commands::NewSession { url } => new_session(&url).await,
    }
}

async fn send(target: &Target, message: &str) -> Result<()> {
    let session_id = detect_session_id(target.session.as_deref())?;
    let client = ApiClient::new(&target.url);

    let reply = client.chat(&session_id, message).await?;
    println!("{}", reply.response);
    Ok(())
}

async fn history(target: &Target) -> Result<()> {
    let session_id = detect_session_id(target.session.as_deref())?;
    let client = ApiClient::new(&target.url);

    let messages = client.messages(&session_id).await?;
    if messages.is_empty() {
        println!("No messages in session {session_id}");
        return Ok(());
    }

    for message in &messages {
        print_message(message);
    }
    Ok(())
}

async fn reset(target: &Target) -> Result<()> {
    let session_id = detect_session_id(target.session.as_deref())?;
    let client = ApiClient::new(&target.url);

    let status = client.reset(&session_id).await?;
    println!("{}", status.message);
    Ok(())
}

async fn new_session(url: &str) -> Result<()> {
    let client = ApiClient::new(url);

    let session = client.create_session().await?;
    save_session_id(&session.id)?;
    print_json(&session)
}
