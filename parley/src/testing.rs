//! Test doubles shared across modules.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::ChatError;
use crate::gemini::{GenerateContentRequest, ModelClient};

type Script = fn(usize) -> Result<Option<String>, ChatError>;

/// Model stub that records every payload and answers from a script.
///
/// The script receives the 1-based call number.
pub struct StubModel {
    pub requests: Mutex<Vec<GenerateContentRequest>>,
    reply: Script,
}

impl StubModel {
    pub fn replying(reply: Script) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn echo() -> Arc<Self> {
        Self::replying(|n| Ok(Some(format!("reply {n}"))))
    }
}

#[async_trait]
impl ModelClient for StubModel {
    async fn generate(&self, request: &GenerateContentRequest) -> Result<Option<String>, ChatError> {
        let mut requests = self.requests.lock().await;
        requests.push(request.clone());
        (self.reply)(requests.len())
    }
}

/// URL of a local port with nothing listening on it.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
