//! Session Messages
//!
//! Chat transcript entries and the updates the session controller publishes
//! to whatever surface is rendering it (terminal, browser view, test harness).
//!
//! # Design Philosophy
//!
//! Surfaces are pure renderers. They apply [`SessionUpdate`]s in the order
//! received and never decide anything themselves, which is what lets the
//! optimistic user message show up before the reply without any hidden UI
//! state.

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchOutcome;

/// Who sent a chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// Typed by the user
    User,
    /// Produced from a server reply (or a failure to get one)
    Agent,
}

/// Rendering hint for a chat message
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Ordinary text
    #[default]
    Normal,
    /// Inline failure report; text carries the error tag
    Error,
}

/// Message identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    pub fn new() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        Self(format!("msg_{id}"))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

/// Session identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a new random session ID
    pub fn new() -> Self {
        Self(format!("session_{}", uuid::Uuid::new_v4().simple()))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of the chat transcript
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Who sent this message
    pub sender: Sender,
    /// Message text
    pub text: String,
    /// Rendering hint
    #[serde(default)]
    pub kind: MessageKind,
    /// When the message was appended (Unix timestamp ms)
    pub timestamp: i64,
    /// Number of knowledge chunks the server reported using, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_count: Option<u64>,
}

impl ChatMessage {
    /// Message typed by the user
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text.into(), MessageKind::Normal)
    }

    /// Agent reply
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text.into(), MessageKind::Normal)
    }

    /// Agent-side error entry
    pub fn agent_error(text: impl Into<String>) -> Self {
        Self::new(Sender::Agent, text.into(), MessageKind::Error)
    }

    /// Attach the server's source count
    #[must_use]
    pub fn with_source_count(mut self, count: Option<u64>) -> Self {
        self.source_count = count;
        self
    }

    /// Whether this entry reports a failure
    pub fn is_error(&self) -> bool {
        self.kind == MessageKind::Error
    }

    fn new(sender: Sender, text: String, kind: MessageKind) -> Self {
        Self {
            id: MessageId::new(),
            sender,
            text,
            kind,
            timestamp: chrono::Utc::now().timestamp_millis(),
            source_count: None,
        }
    }
}

/// Updates from the session controller to a surface
///
/// Emitted in the exact order the state changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionUpdate {
    /// `pending` flipped
    Pending {
        /// New value
        pending: bool,
    },

    /// The error banner changed (`None` clears it)
    Error {
        /// New banner text
        error: Option<String>,
    },

    /// A message was appended to the transcript
    MessageAppended {
        /// The new message
        message: ChatMessage,
    },

    /// The single-shot response view was replaced
    ResponseUpdated {
        /// Pretty-printed display value
        display: String,
    },

    /// A dispatch finished (sent after the state changes it caused)
    Resolved {
        /// What the dispatcher returned
        outcome: DispatchOutcome,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_session_id_unique() {
        let id1 = SessionId::new();
        let id2 = SessionId::new();
        assert_ne!(id1, id2);
        assert!(id1.0.starts_with("session_"));
    }

    #[test]
    fn test_chat_message_constructors() {
        let user = ChatMessage::user("hello");
        assert_eq!(user.sender, Sender::User);
        assert!(!user.is_error());

        let err = ChatMessage::agent_error("[Error] boom");
        assert_eq!(err.sender, Sender::Agent);
        assert!(err.is_error());

        let reply = ChatMessage::agent("hi").with_source_count(Some(1));
        assert_eq!(reply.source_count, Some(1));
    }

    #[test]
    fn test_sender_serializes_lowercase() {
        let json = serde_json::to_value(Sender::Agent).unwrap();
        assert_eq!(json, serde_json::json!("agent"));
    }
}
