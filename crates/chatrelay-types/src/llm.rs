//! Completion backend error taxonomy.
//!
//! Every variant is handled the same way by the relay: the reply is
//! replaced with a fixed apology and the request still succeeds. The
//! distinction exists for the logs.

use thiserror::Error;

/// Errors from the chat-completion backend.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited")]
    RateLimited,

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
