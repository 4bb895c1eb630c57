//! Log sink probe handler.
//!
//! GET /api/test-log
//!
//! Appends two canned rows under debug identifiers so an operator can
//! verify the sheet is reachable. Rows are never deduplicated; every
//! call adds two more.

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use chatrelay_types::log::LogWriteOutcome;

use crate::state::AppState;

/// GET /api/test-log - Emit two test rows and report the outcome.
pub async fn test_log(State(state): State<AppState>) -> Json<Value> {
    let outcomes = state.relay.test_log().await;

    let dropped = outcomes.iter().find_map(|outcome| match outcome {
        LogWriteOutcome::Dropped(reason) => Some(reason.clone()),
        _ => None,
    });

    match dropped {
        Some(detail) => Json(json!({ "status": "error", "detail": detail })),
        None => Json(json!({
            "status": "success",
            "message": "Test logs sent. Check the sheet and server logs.",
        })),
    }
}
