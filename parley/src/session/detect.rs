//! Session id lookup for the thin client.
//!
//! Mirrors what the browser keeps in `localStorage`: one id per user,
//! generated once and reused afterwards.

use std::path::Path;

use anyhow::{Context, Result};

use crate::config::app_dir;
use crate::models::generate_session_id;

const SESSION_FILE: &str = "session";

/// Resolve the session id to talk as.
///
/// Priority order:
/// 1. Explicit `--session` value
/// 2. `~/.parley/session`
/// 3. A fresh random id, written to `~/.parley/session`
pub fn detect_session_id(explicit: Option<&str>) -> Result<String> {
    if let Some(id) = explicit.map(str::trim).filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }

    let path = app_dir()?.join(SESSION_FILE);
    load_or_create(&path)
}

/// Make `session_id` the stored local session.
pub fn save_session_id(session_id: &str) -> Result<()> {
    let path = app_dir()?.join(SESSION_FILE);
    write_session_file(&path, session_id)
}

fn load_or_create(path: &Path) -> Result<String> {
    if let Some(id) = read_session_file(path)? {
        return Ok(id);
    }

    let id = generate_session_id();
    write_session_file(path, &id)?;
    tracing::debug!(session_id = %id, "Generated local session id");
    Ok(id)
}

fn read_session_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let session_id = content.trim().to_string();

    if session_id.is_empty() {
        return Ok(None);
    }

    Ok(Some(session_id))
}

fn write_session_file(path: &Path, session_id: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    std::fs::write(path, session_id).with_context(|| format!("Failed to write {}", path.display()))
}
