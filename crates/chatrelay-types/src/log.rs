//! Spreadsheet log types.
//!
//! Every message through the relay is mirrored to an append-only log:
//! one [`LogRow`] per event, written to the remote sheet or, on failure,
//! to a local fallback file. Rows are write-once; nothing in this system
//! reads them back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Experiment arm recorded on every row. Fixed for this deployment.
pub const ARM_LABEL: &str = "crt-random";

/// Role of a log row. One more variant than the chat roles: session
/// creation is logged too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRole {
    Session,
    User,
    Assistant,
}

impl fmt::Display for LogRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogRole::Session => write!(f, "session"),
            LogRole::User => write!(f, "user"),
            LogRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One append-only record destined for the conversation sheet.
///
/// Schema: timestamp | participant_id | bot_id | arm | role | content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRow {
    pub timestamp: String,
    pub participant_id: String,
    pub bot_id: String,
    pub arm: String,
    pub role: LogRole,
    pub content: String,
}

impl LogRow {
    /// Build a row, capturing the timestamp at call time (local time,
    /// second resolution, matching the sheet's existing rows).
    pub fn new(
        participant_id: impl Into<String>,
        bot_id: impl Into<String>,
        role: LogRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            participant_id: participant_id.into(),
            bot_id: bot_id.into(),
            arm: ARM_LABEL.to_string(),
            role,
            content: content.into(),
        }
    }

    /// Ordered cell values for the remote append.
    pub fn cells(&self) -> [&str; 6] {
        [
            &self.timestamp,
            &self.participant_id,
            &self.bot_id,
            &self.arm,
            self.role_str(),
            &self.content,
        ]
    }

    fn role_str(&self) -> &'static str {
        match self.role {
            LogRole::Session => "session",
            LogRole::User => "user",
            LogRole::Assistant => "assistant",
        }
    }

    /// Comma-joined plain-text rendering used by the fallback file.
    pub fn fallback_line(&self) -> String {
        format!(
            "{}, {}, {}, {}, {}, {}",
            self.timestamp, self.participant_id, self.bot_id, self.arm, self.role, self.content
        )
    }
}

/// What actually happened to a best-effort append.
///
/// The sink never fails from the caller's perspective; handlers on the
/// chat path ignore this value, the test-log endpoint reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogWriteOutcome {
    /// Row appended to the remote sheet.
    Remote,
    /// Remote append failed; row appended to the local fallback file.
    FallbackFile,
    /// Sink was never configured; row skipped.
    Skipped,
    /// Remote and fallback both failed; row lost.
    Dropped(String),
}

impl LogWriteOutcome {
    pub fn is_dropped(&self) -> bool {
        matches!(self, LogWriteOutcome::Dropped(_))
    }
}
