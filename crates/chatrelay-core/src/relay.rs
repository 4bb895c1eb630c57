//! Relay service composing the conversation store, log sink, and
//! completion backend.
//!
//! One instance serves the whole process. Dependencies are injected
//! explicitly; a completion backend that failed to initialize at startup
//! is `None` and stays unavailable for the process lifetime, with every
//! chat reply degraded to the fixed apology.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use chatrelay_types::chat::{ConversationKey, Turn};
use chatrelay_types::error::ChatInputError;
use chatrelay_types::log::{LogRole, LogRow, LogWriteOutcome};

use crate::conversation::ConversationStore;
use crate::llm::CompletionBackend;
use crate::log::LogSink;
use crate::{bots, id};

/// Reply substituted whenever the completion backend is unavailable.
pub const APOLOGY_REPLY: &str = "Sorry, I couldn't generate a response right now.";

/// Sentinel participant id when the survey sends none.
pub const UNKNOWN_PARTICIPANT: &str = "NO_PID";

/// Identifiers used by the test-log probe.
const DEBUG_PARTICIPANT: &str = "DEBUG_PID";
const DEBUG_BOT: &str = "LongBot1";

/// Response body of session creation.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreated {
    pub session_id: String,
    pub prolific_pid: String,
    pub bot_id: String,
}

/// Response body of a chat turn.
///
/// `session_id` here is a per-request composite of participant, bot, and
/// coarse timestamp. It is intentionally unrelated to the identifier
/// minted by session creation; the survey tooling consumes them as two
/// independent values.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
}

/// Orchestrates the three relay operations.
///
/// Generic over [`LogSink`] and [`CompletionBackend`] so the logic tests
/// against in-memory fakes (chatrelay-core never depends on
/// chatrelay-infra).
pub struct RelayService<L: LogSink, C: CompletionBackend> {
    store: ConversationStore,
    log: Arc<L>,
    completion: Option<Arc<C>>,
}

impl<L: LogSink, C: CompletionBackend> RelayService<L, C> {
    /// Create a relay service with the given dependencies.
    ///
    /// `completion: None` means the backend was never configured; chat
    /// still works but every reply is the apology.
    pub fn new(store: ConversationStore, log: Arc<L>, completion: Option<Arc<C>>) -> Self {
        Self {
            store,
            log,
            completion,
        }
    }

    /// Access the conversation store.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Create a session: resolve identities, mint an id, log one row.
    ///
    /// Tolerates malformed input via defaults; there is no error path.
    pub async fn create_session(
        &self,
        participant_id: Option<&str>,
        bot_code: Option<&str>,
    ) -> SessionCreated {
        let pid = participant_id.unwrap_or(UNKNOWN_PARTICIPANT);
        let bot_id = bots::resolve_or_unknown(bot_code.unwrap_or(""));
        let session_id = id::generate_session_id();

        self.log
            .append(LogRow::new(
                pid,
                bot_id.as_str(),
                LogRole::Session,
                format!("session_created:{session_id}"),
            ))
            .await;

        SessionCreated {
            session_id,
            prolific_pid: pid.to_string(),
            bot_id,
        }
    }

    /// Handle one chat turn.
    ///
    /// Validates input before any side effect, then: store the user turn,
    /// log it, complete against the post-truncation history, store the
    /// assistant turn (only on success -- the apology is logged but never
    /// enters the history), log the reply.
    pub async fn chat(
        &self,
        participant_id: &str,
        bot_code: &str,
        message: &str,
    ) -> Result<ChatReply, ChatInputError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatInputError::MissingField("message"));
        }
        if bot_code.is_empty() {
            return Err(ChatInputError::MissingField("bot"));
        }

        let bot_id = bots::resolve(bot_code);
        let key = ConversationKey::new(participant_id, bot_id.clone());

        let history = self.store.append_turn(&key, Turn::user(message));
        self.log
            .append(LogRow::new(
                participant_id,
                bot_id.as_str(),
                LogRole::User,
                message,
            ))
            .await;

        let reply = match &self.completion {
            Some(backend) => match backend.complete(&history).await {
                Ok(text) => {
                    self.store.append_turn(&key, Turn::assistant(text.clone()));
                    text
                }
                Err(err) => {
                    warn!(conversation = %key, error = %err, "completion failed; substituting apology");
                    APOLOGY_REPLY.to_string()
                }
            },
            None => {
                debug!(conversation = %key, "completion backend not configured; substituting apology");
                APOLOGY_REPLY.to_string()
            }
        };

        self.log
            .append(LogRow::new(
                participant_id,
                bot_id.as_str(),
                LogRole::Assistant,
                reply.as_str(),
            ))
            .await;

        let session_id = format!(
            "{participant_id}:{bot_id}:{}",
            chrono::Utc::now().timestamp()
        );
        Ok(ChatReply { reply, session_id })
    }

    /// Append two canned rows under debug identifiers to verify the sink
    /// is reachable. Returns the outcome of each append.
    pub async fn test_log(&self) -> [LogWriteOutcome; 2] {
        let user = self
            .log
            .append(LogRow::new(
                DEBUG_PARTICIPANT,
                DEBUG_BOT,
                LogRole::User,
                "Test user message",
            ))
            .await;
        let assistant = self
            .log
            .append(LogRow::new(
                DEBUG_PARTICIPANT,
                DEBUG_BOT,
                LogRole::Assistant,
                "Test assistant reply",
            ))
            .await;
        [user, assistant]
    }
}
