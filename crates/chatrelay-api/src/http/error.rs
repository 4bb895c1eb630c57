//! Application error type mapping to the relay's fixed wire format.
//!
//! The survey widget expects `{"error": "..."}` bodies with a 400 status
//! for anything it sent wrong; upstream failures never surface here (the
//! relay degrades them to a normal 200 response).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use chatrelay_types::error::ChatInputError;

/// Client-facing errors for the chat endpoint.
#[derive(Debug)]
pub enum ApiError {
    /// A required field was missing or empty.
    Input(ChatInputError),
    /// The request body was not valid JSON.
    InvalidBody,
}

impl From<ChatInputError> for ApiError {
    fn from(e: ChatInputError) -> Self {
        ApiError::Input(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Input(e) => e.to_string(),
            ApiError::InvalidBody => "Invalid JSON body".to_string(),
        };

        (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
    }
}
