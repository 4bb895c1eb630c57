//! Chat turn handler.
//!
//! POST /api/chat with body `{ prolific_pid | test_pid | pid?, bot, message }`.
//!
//! The participant id is accepted under several field names for
//! compatibility with older widget builds; the first non-empty alias
//! wins. A missing `message` or `bot` is a 400 before any side effect;
//! upstream failures still produce a 200 with a substituted reply.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;

use chatrelay_core::relay::{ChatReply, UNKNOWN_PARTICIPANT};

use crate::http::error::ApiError;
use crate::state::AppState;

/// Request body for a chat turn.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prolific_pid: Option<String>,
    #[serde(default)]
    pub test_pid: Option<String>,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(default)]
    pub bot: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    /// First non-empty participant alias, else the sentinel.
    fn participant_id(&self) -> &str {
        [&self.prolific_pid, &self.test_pid, &self.pid]
            .into_iter()
            .find_map(|alias| alias.as_deref().filter(|value| !value.is_empty()))
            .unwrap_or(UNKNOWN_PARTICIPANT)
    }
}

/// POST /api/chat - Relay one message and return the reply.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::InvalidBody)?;

    let reply = state
        .relay
        .chat(
            body.participant_id(),
            body.bot.as_deref().unwrap_or(""),
            body.message.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(Json(reply))
}
