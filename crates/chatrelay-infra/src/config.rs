//! Configuration loader for the relay.
//!
//! Reads `relay.toml` from the working directory and deserializes it
//! into [`RelayConfig`], falling back to defaults when the file is
//! missing or malformed. Environment variables then override the file:
//! secrets (`OPENAI_API_KEY`, `SHEETS_API_TOKEN`) are env-only and never
//! read from the file.

use std::path::Path;

use secrecy::SecretString;
use tracing::{debug, warn};

use chatrelay_types::config::RelayConfig;

/// Load configuration from a file path, then apply environment overrides.
///
/// - Missing file: defaults, logged at debug.
/// - Unreadable or malformed file: defaults, logged at warn.
pub async fn load_config(path: impl AsRef<Path>) -> RelayConfig {
    let path = path.as_ref();

    let mut config = match tokio::fs::read_to_string(path).await {
        Ok(content) => match toml::from_str::<RelayConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to parse {}: {err}, using defaults", path.display());
                RelayConfig::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("No config file at {}, using defaults", path.display());
            RelayConfig::default()
        }
        Err(err) => {
            warn!("Failed to read {}: {err}, using defaults", path.display());
            RelayConfig::default()
        }
    };

    apply_env_overrides(&mut config);
    warn_on_degraded(&config);
    config
}

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut RelayConfig) {
    apply_overrides_from(config, |name| std::env::var(name).ok());
}

/// Override config fields from a variable lookup. Empty values are
/// treated as unset.
fn apply_overrides_from(config: &mut RelayConfig, vars: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| vars(name).filter(|v| !v.is_empty());

    if let Some(key) = get("OPENAI_API_KEY") {
        config.completion.api_key = Some(SecretString::from(key));
    }
    if let Some(url) = get("SHEET_URL") {
        config.sheets.sheet_url = Some(url);
    }
    if let Some(token) = get("SHEETS_API_TOKEN") {
        config.sheets.api_token = Some(SecretString::from(token));
    }
    if let Some(origin) = get("ALLOWED_ORIGIN") {
        config.cors.extra_origin = Some(origin);
    }
    if let Some(prompt) = get("CHATRELAY_SYSTEM_PROMPT") {
        config.completion.system_prompt = prompt;
    }
    if let Some(dir) = get("CHATRELAY_STATIC_DIR") {
        config.server.static_dir = dir;
    }
}

/// Emit one startup warning per dependency that will run degraded for
/// the process lifetime.
fn warn_on_degraded(config: &RelayConfig) {
    if config.completion.api_key.is_none() {
        warn!("OPENAI_API_KEY not set; chat replies will be the fixed apology");
    }
    match (&config.sheets.sheet_url, &config.sheets.api_token) {
        (Some(_), Some(_)) => {}
        (None, None) => warn!("SHEET_URL/SHEETS_API_TOKEN not set; sheet logging disabled"),
        (Some(_), None) => warn!("SHEET_URL set but SHEETS_API_TOKEN missing; sheet logging disabled"),
        (None, Some(_)) => warn!("SHEETS_API_TOKEN set but SHEET_URL missing; sheet logging disabled"),
    }
}
