//! Chat conversation types for Chatrelay.
//!
//! A conversation is a bounded window of [`Turn`]s keyed by
//! [`ConversationKey`] (participant + bot). These shapes are shared by the
//! in-memory store, the completion client, and the HTTP handlers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a turn in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One message in a conversation. Immutable once appended to the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Identifies one conversation thread: participant + resolved bot.
///
/// Not unique across process restarts; conversation state is volatile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub participant_id: String,
    pub bot_id: String,
}

impl ConversationKey {
    pub fn new(participant_id: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            bot_id: bot_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.participant_id, self.bot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_serde() {
        let role = MessageRole::Assistant;
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, "\"assistant\"");
        let parsed: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, MessageRole::Assistant);
    }

    #[test]
    fn test_message_role_invalid() {
        assert!("moderator".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_conversation_key_display() {
        let key = ConversationKey::new("P123", "LongBot2");
        assert_eq!(key.to_string(), "P123:LongBot2");
    }

    #[test]
    fn test_turn_constructors() {
        let turn = Turn::user("Hi");
        assert_eq!(turn.role, MessageRole::User);
        assert_eq!(turn.content, "Hi");
        let turn = Turn::assistant("Hello");
        assert_eq!(turn.role, MessageRole::Assistant);
    }
}
