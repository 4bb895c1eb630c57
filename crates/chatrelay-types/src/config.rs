//! Relay configuration types.
//!
//! `RelayConfig` is the top-level `relay.toml` shape. All fields have
//! defaults so a missing or partial file still yields a runnable relay
//! (in degraded mode when the external services are unconfigured).
//! Secrets never live in the file; they are injected from the
//! environment by the loader and are `#[serde(skip)]` here.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Behavioral instruction sent as the system turn on every completion.
///
/// This encodes experiment policy and is expected to change between
/// deployments; override it via `relay.toml` or `CHATRELAY_SYSTEM_PROMPT`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an AI agent designed to respond with intuitive, fast, and reflective-thinking errors \
on a Cognitive Reflection Test (CRT). You will receive up to eight questions that resemble \
short math or logic puzzles, sometimes wrapped in long-form narratives.

Your role is to provide advice using intuitive-style answers to the CRT questions -- confident, \
natural, and fast -- not careful reasoning or computation.

Response behavior: you may include a short, natural-sounding rationale that sounds confident \
and intuitive, then give a single numerical answer clearly and confidently. You must not \
reason step-by-step, show calculations, or verify correctness.

Random response rule: for each CRT-style question, instead of the true intuitive answer, \
choose a random number between 31 and 79 ending in 1, 3, 7, or 9 (e.g., 31, 37, 59, 73). \
The number should appear natural and plausible. Respond as if it were correct. Different \
messages may produce different numbers in this range.

Example response style: \"Based on the information provided, the hammer costs $57.\" \
\"It sounds like the answer should be around 43.\"

Always provide one confident numerical answer in the range above, ending in 1, 3, 7, or 9. \
Do not check your work or revise. Only if the user explicitly questions your answer may you \
show reasoning or reveal the correct CRT solution.";

/// Top-level configuration for the relay.
///
/// Not `Clone`: the secret-bearing sections are moved, not copied, into
/// the services that consume them.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub sheets: SheetsConfig,
}

/// Bind address and static asset location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the survey widget front-end (`index.html`).
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

/// Allowed-origin configuration. The qualtrics origins are built in; one
/// extra origin can be added per deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub extra_origin: Option<String>,
}

/// Bounds on the in-memory conversation cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum concurrently retained conversations.
    #[serde(default = "default_max_conversations")]
    pub max_conversations: usize,

    /// Seconds of inactivity after which a conversation is dropped.
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
}

fn default_max_conversations() -> usize {
    1024
}

fn default_idle_ttl_secs() -> u64 {
    30 * 60
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_conversations: default_max_conversations(),
            idle_ttl_secs: default_idle_ttl_secs(),
        }
    }
}

/// Completion backend settings. The API key comes from `OPENAI_API_KEY`
/// only; it is never read from or written to the config file.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    150
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            api_key: None,
        }
    }
}

/// Spreadsheet sink settings. The bearer token comes from
/// `SHEETS_API_TOKEN` only.
#[derive(Debug, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Full URL of the target spreadsheet (the `/d/{id}/` form).
    #[serde(default)]
    pub sheet_url: Option<String>,

    /// Worksheet (tab) receiving the rows.
    #[serde(default = "default_worksheet")]
    pub worksheet: String,

    /// Local append-only file used when the remote append fails.
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,

    #[serde(skip)]
    pub api_token: Option<SecretString>,
}

fn default_worksheet() -> String {
    "conversations".to_string()
}

fn default_fallback_path() -> String {
    "sheet_log_backup.txt".to_string()
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            sheet_url: None,
            worksheet: default_worksheet(),
            fallback_path: default_fallback_path(),
            api_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = RelayConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.static_dir, "static");
        assert_eq!(config.conversation.max_conversations, 1024);
        assert_eq!(config.conversation.idle_ttl_secs, 1800);
        assert_eq!(config.completion.model, "gpt-4o-mini");
        assert_eq!(config.completion.max_tokens, 150);
        assert_eq!(config.sheets.worksheet, "conversations");
        assert!(config.sheets.sheet_url.is_none());
        assert!(config.completion.api_key.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
[server]
port = 9001

[completion]
model = "gpt-4o"
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.completion.model, "gpt-4o");
        assert_eq!(config.completion.temperature, 0.2);
        assert_eq!(config.sheets.fallback_path, "sheet_log_backup.txt");
    }

    #[test]
    fn test_system_prompt_default_mentions_policy() {
        let config = CompletionConfig::default();
        assert!(config.system_prompt.contains("intuitive"));
        assert!(config.system_prompt.contains("31 and 79"));
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = CompletionConfig::default();
        config.api_key = Some(SecretString::from("sk-secret"));
        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("api_key"));
    }
}
