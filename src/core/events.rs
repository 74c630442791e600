//! Inbound webhook event types.
//!
//! The voice platform delivers every session event to the same webhook with a
//! `type` discriminator. The set of event types is closed, so decoding an
//! unknown `type` fails at the serde boundary and surfaces as a 400 without
//! touching the conversation store.

use serde::{Deserialize, Serialize};

/// Common payload carried by every webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Stable key grouping all messages of one voice session.
    pub conversation_id: String,
    /// Turn identifier supplied by the platform.
    pub turn_id: String,
    /// Transcribed utterance text. For `session.start` this is a connection
    /// marker rather than real speech; it is appended to the log all the same
    /// to keep turn ordering uniform across event types.
    #[serde(default)]
    pub text: String,
}

/// A voice event delivered to the agent webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookEvent {
    /// A new session connected; prior history for the conversation is stale.
    #[serde(rename = "session.start")]
    SessionStart(EventPayload),

    /// A completed user utterance ready for a generated reply.
    #[serde(rename = "message")]
    Message(EventPayload),

    /// Mid-session state change. Acknowledged, no action.
    #[serde(rename = "session.update")]
    SessionUpdate(EventPayload),

    /// The session disconnected. Acknowledged, no action.
    #[serde(rename = "session.end")]
    SessionEnd(EventPayload),
}

impl WebhookEvent {
    pub fn payload(&self) -> &EventPayload {
        match self {
            Self::SessionStart(payload)
            | Self::Message(payload)
            | Self::SessionUpdate(payload)
            | Self::SessionEnd(payload) => payload,
        }
    }

    /// Event type string for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SessionStart(_) => "session.start",
            Self::Message(_) => "message",
            Self::SessionUpdate(_) => "session.update",
            Self::SessionEnd(_) => "session.end",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_message_event() {
        let json = r#"{
            "type": "message",
            "conversation_id": "conv-1",
            "turn_id": "turn-1",
            "text": "What is Layercode?"
        }"#;

        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.kind(), "message");
        assert_eq!(event.payload().conversation_id, "conv-1");
        assert_eq!(event.payload().text, "What is Layercode?");
    }

    #[test]
    fn test_decode_session_start_without_text() {
        let json = r#"{"type": "session.start", "conversation_id": "c", "turn_id": "t"}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, WebhookEvent::SessionStart(_)));
        assert_eq!(event.payload().text, "");
    }

    #[test]
    fn test_unknown_type_fails_to_decode() {
        let json = r#"{"type": "session.pause", "conversation_id": "c", "turn_id": "t"}"#;
        assert!(serde_json::from_str::<WebhookEvent>(json).is_err());
    }

    #[test]
    fn test_all_recognized_types_decode() {
        for kind in ["session.start", "message", "session.update", "session.end"] {
            let json = format!(
                r#"{{"type": "{kind}", "conversation_id": "c", "turn_id": "t", "text": ""}}"#
            );
            let event: WebhookEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(event.kind(), kind);
        }
    }
}
