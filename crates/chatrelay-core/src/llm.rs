//! CompletionBackend trait definition.
//!
//! The seam for the external chat-completion service. Uses native async
//! fn in traits (RPITIT, Rust 2024 edition); the concrete implementation
//! lives in chatrelay-infra.

use chatrelay_types::chat::Turn;
use chatrelay_types::llm::CompletionError;

/// Backend producing one assistant reply from a bounded conversation.
///
/// Implementations prepend their configured system instruction; callers
/// pass only the user/assistant history. No streaming, no retries -- the
/// relay substitutes a fixed apology on any error.
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        history: &[Turn],
    ) -> impl std::future::Future<Output = Result<String, CompletionError>> + Send;
}
