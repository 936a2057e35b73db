//! Layered configuration.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. TOML file (`--config` or `~/.parley/config.toml`)
//! 3. `PARLEY_*` environment variables, `__` separating nested keys
//!    (e.g. `PARLEY_SERVER__PORT=8080`)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::gemini::{GenerationConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Per-user directory holding the config file and the CLI session id.
const APP_DIR: &str = ".parley";
const CONFIG_FILE: &str = "config.toml";

/// Environment variables consulted for the API key, after the config value.
const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_AI_API_KEY", "AI_API_KEY"];
/// Value shipped in sample configs; never a real key.
const API_KEY_PLACEHOLDER: &str = "YOUR_GEMINI_API_KEY_HERE";

/// Instruction used when neither `system_instruction` nor `system_instruction_file` is set.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are the assistant of a small web chat. Keep answers quick, concise and short \
unless the user explicitly asks for detail. Write plain text only: no markdown, \
no bold or italic markers. When sharing a link, write the bare URL. If you do not \
know the answer, say so instead of guessing.";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve this directory instead of the bundled UI.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            static_dir: None,
        }
    }
}

/// Upstream model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: generation.temperature,
            top_k: generation.top_k,
            top_p: generation.top_p,
            max_output_tokens: generation.max_output_tokens,
        }
    }
}

impl GeminiConfig {
    pub const fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }

    /// Resolve the API key from the config value, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), |name| std::env::var(name).ok())
    }
}

/// Conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// How many earlier messages are sent along with a new one.
    pub history_window: usize,
    pub max_message_chars: usize,
    pub system_instruction: Option<String>,
    /// Read the instruction from this file; wins over `system_instruction`.
    pub system_instruction_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            max_message_chars: 4000,
            system_instruction: None,
            system_instruction_file: None,
        }
    }
}

impl ChatConfig {
    /// Load the system instruction. Called once at startup.
    pub fn load_system_instruction(&self) -> Result<String> {
        if let Some(path) = &self.system_instruction_file {
            return std::fs::read_to_string(path).with_context(|| {
                format!("Failed to read system instruction from {}", path.display())
            });
        }

        Ok(self
            .system_instruction
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string()))
    }
}

impl Config {
    /// Build the figment for an explicit config file, or the per-user default.
    pub fn figment(path: Option<&Path>) -> Figment {
        let file = path.map(Path::to_path_buf).or_else(default_config_path);

        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed("PARLEY_").split("__"))
    }

    /// Load configuration from all sources.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }
}

/// `~/.parley`
pub fn app_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(APP_DIR))
}

fn default_config_path() -> Option<PathBuf> {
    app_dir().ok().map(|dir| dir.join(CONFIG_FILE))
}

/// First usable key among the configured value and [`API_KEY_ENV_VARS`].
///
/// Blank values and the sample placeholder count as missing.
pub fn resolve_api_key<F>(configured: Option<&str>, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let usable = |key: &str| {
        let key = key.trim();
        (!key.is_empty() && key != API_KEY_PLACEHOLDER).then(|| key.to_string())
    };

    configured.and_then(usable).or_else(|| {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).as_deref().and_then(usable))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn api_key_prefers_config_value() {
        let key = resolve_api_key(Some("from-config"), env(&[("GEMINI_API_KEY", "from-env")]));
        assert_eq!(key.as_deref(), Some("from-config"));
    }

    #[test]
    fn api_key_falls_back_through_env_in_order() {
        let key = resolve_api_key(
            None,
            env(&[("AI_API_KEY", "third"), ("GOOGLE_AI_API_KEY", "second")]),
        );
        assert_eq!(key.as_deref(), Some("second"));

        let key = resolve_api_key(None, env(&[("AI_API_KEY", "third")]));
        assert_eq!(key.as_deref(), Some("third"));
    }

    #[test]
    fn api_key_skips_placeholder_and_blank() {
        let key = resolve_api_key(
            Some(API_KEY_PLACEHOLDER),
            env(&[("GEMINI_API_KEY", "  "), ("AI_API_KEY", "real")]),
        );
        assert_eq!(key.as_deref(), Some("real"));

        assert_eq!(resolve_api_key(Some(""), env(&[])), None);
    }

    #[test]
    fn defaults_match_upstream_contract() {
        let config = Config::default();
        assert_eq!(config.chat.history_window, 10);
        assert_eq!(config.chat.max_message_chars, 4000);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.generation_config(), GenerationConfig::default());
    }

    #[test]
    fn file_and_env_layers_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "parley.toml",
                r#"
                [server]
                port = 8080

                [chat]
                history_window = 4
                system_instruction = "Answer in haiku."
                "#,
            )?;
            jail.set_env("PARLEY_SERVER__HOST", "0.0.0.0");
            jail.set_env("PARLEY_GEMINI__TEMPERATURE", "0.2");

            let config = Config::load(Some(Path::new("parley.toml")))?;
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.server.host, "0.0.0.0");
            assert_eq!(config.chat.history_window, 4);
            assert!((config.gemini.temperature - 0.2).abs() < f32::EPSILON);
            assert_eq!(config.gemini.top_k, 40);

            let instruction = config
                .chat
                .load_system_instruction()
                .map_err(|e| e.to_string())?;
            assert_eq!(instruction, "Answer in haiku.");
            Ok(())
        });
    }

    #[test]
    fn missing_config_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = Config::load(Some(Path::new("does-not-exist.toml")))?;
            assert_eq!(config.server.port, 5000);
            Ok(())
        });
    }

    #[test]
    fn system_instruction_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("instruction.txt");
        std::fs::write(&path, "From file.").unwrap();

        let chat = ChatConfig {
            system_instruction: Some("Inline.".to_string()),
            system_instruction_file: Some(path),
            ..ChatConfig::default()
        };
        assert_eq!(chat.load_system_instruction().unwrap(), "From file.");
    }

    #[test]
    fn unreadable_instruction_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let chat = ChatConfig {
            system_instruction_file: Some(dir.path().join("missing.txt")),
            ..ChatConfig::default()
        };
        assert!(chat.load_system_instruction().is_err());
        assert_eq!(
            ChatConfig::default().load_system_instruction().unwrap(),
            DEFAULT_SYSTEM_INSTRUCTION
        );
    }

    #[test]
    fn bundled_rhythia_instruction_loads() {
        let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("..");
        let config = Config::load(Some(&workspace.join("parley.example.toml"))).unwrap();

        let relative = config.chat.system_instruction_file.clone().unwrap();
        assert_eq!(relative, Path::new("parley/prompts/rhythia.txt"));

        let chat = ChatConfig {
            system_instruction_file: Some(workspace.join(relative)),
            ..config.chat
        };
        let instruction = chat.load_system_instruction().unwrap();
        assert!(instruction.starts_with("ESSENTIALS"));
        assert!(instruction.contains("Rhythia"));
        assert!(instruction.contains("https://wiki.rhythia.net"));
    }
}
