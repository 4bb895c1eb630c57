//! Session creation handler.
//!
//! POST /api/session?pid=<participant>&bot=<code>
//!
//! Both query parameters are optional; missing values resolve to the
//! sentinel participant and bot identities. There is no error path.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;

use chatrelay_core::relay::SessionCreated;

use crate::state::AppState;

/// Query parameters for session creation.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub pid: Option<String>,
    pub bot: Option<String>,
}

/// POST /api/session - Mint a session id and log the creation.
pub async fn create_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<SessionCreated> {
    let session = state
        .relay
        .create_session(query.pid.as_deref(), query.bot.as_deref())
        .await;
    Json(session)
}
