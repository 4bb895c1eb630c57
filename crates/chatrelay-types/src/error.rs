use thiserror::Error;

/// Client-input errors on the chat endpoint. Raised before any side
/// effect and surfaced verbatim as HTTP 400 bodies.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatInputError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),
}

/// Errors while loading configuration. Startup-only; every variant is
/// downgraded to a warning and the process continues with defaults.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(String),

    #[error("failed to parse config file: {0}")]
    Parse(String),
}
