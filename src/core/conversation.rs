//! Conversation message model.
//!
//! Messages are immutable once appended to the store and are kept in arrival
//! order: the user message for a turn always precedes the assistant message
//! answering it.

use serde::{Deserialize, Serialize};

/// Speaker role of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire-format role string, as sent to the chat-completions API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One part of a message body. Voice sessions only carry text today, but the
/// platform contract reserves room for other part kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePart {
    Text { text: String },
}

/// A single conversation message.
///
/// `id` is the platform-supplied turn identifier for user messages and a
/// freshly generated UUID for assistant messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub conversation_id: String,
    pub parts: Vec<MessagePart>,
}

impl Message {
    /// Build a user message from the turn identifier and utterance text.
    pub fn user(
        conversation_id: impl Into<String>,
        turn_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: turn_id.into(),
            role: Role::User,
            conversation_id: conversation_id.into(),
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    /// Build an assistant message with a freshly generated identifier.
    pub fn assistant(conversation_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: Role::Assistant,
            conversation_id: conversation_id.into(),
            parts: vec![MessagePart::Text { text: text.into() }],
        }
    }

    /// Concatenated text of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|part| match part {
                MessagePart::Text { text } => text.as_str(),
            })
            .collect()
    }
}
