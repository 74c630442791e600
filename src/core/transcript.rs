//! Client-side transcript reassembly.
//!
//! User speech arrives as interim and final transcript deltas that may be
//! delivered out of order; each delta carries a per-turn counter giving its
//! position. The reassembler keeps a sorted buffer per turn and recomputes
//! the displayed text on every arrival, so the rendered transcript is always
//! the concatenation of the known fragments in counter order.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

/// Events the platform delivers to a connected client.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "turn.end")]
    TurnEnd { turn_id: Option<String> },

    #[serde(rename = "user.transcript.delta")]
    TranscriptDelta {
        turn_id: Option<String>,
        delta_counter: Option<u64>,
        content: Option<String>,
    },

    #[serde(rename = "user.transcript.interim_delta")]
    TranscriptInterimDelta {
        turn_id: Option<String>,
        delta_counter: Option<u64>,
        content: Option<String>,
    },

    #[serde(rename = "response.text")]
    ResponseText { content: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

/// One displayed transcript line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub turn_id: Option<String>,
    pub speaker: Speaker,
    pub text: String,
}

/// Reassembles ordered transcript lines from the client event stream.
#[derive(Debug, Default)]
pub struct TranscriptReassembler {
    /// Per-turn fragment buffers keyed by delta counter.
    buffers: HashMap<String, BTreeMap<u64, String>>,
    entries: Vec<TranscriptEntry>,
}

impl TranscriptReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently displayed transcript, oldest first.
    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// Drop all entries and in-flight buffers.
    pub fn reset(&mut self) {
        self.buffers.clear();
        self.entries.clear();
    }

    pub fn apply(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::TranscriptDelta {
                turn_id,
                delta_counter,
                content,
            }
            | ClientEvent::TranscriptInterimDelta {
                turn_id,
                delta_counter,
                content,
            } => {
                let content = content.unwrap_or_default();
                match (turn_id, delta_counter) {
                    (Some(turn_id), Some(counter)) => {
                        let buffer = self.buffers.entry(turn_id.clone()).or_default();
                        buffer.insert(counter, content);
                        let text: String =
                            buffer.values().map(String::as_str).collect();
                        self.upsert_user_entry(Some(turn_id), text);
                    }
                    (turn_id, _) => {
                        // Without both a turn id and a counter there is no
                        // ordering contract; show the payload verbatim and
                        // stop buffering this turn.
                        if let Some(id) = &turn_id {
                            self.buffers.remove(id);
                        }
                        self.upsert_user_entry(turn_id, content);
                    }
                }
            }
            ClientEvent::TurnEnd { turn_id } => {
                if let Some(turn_id) = turn_id {
                    self.buffers.remove(&turn_id);
                }
            }
            ClientEvent::ResponseText { content } => {
                self.entries.push(TranscriptEntry {
                    turn_id: None,
                    speaker: Speaker::Assistant,
                    text: content,
                });
            }
        }
    }

    /// Replace the displayed text for an existing user line with this
    /// turn id, or append a new line if none exists yet.
    fn upsert_user_entry(&mut self, turn_id: Option<String>, text: String) {
        let existing = match &turn_id {
            Some(id) => self.entries.iter_mut().rev().find(|entry| {
                entry.speaker == Speaker::User && entry.turn_id.as_deref() == Some(id)
            }),
            // Successive id-less deltas refine the same utterance; replace
            // the trailing unattributed line instead of stacking duplicates.
            None => self
                .entries
                .last_mut()
                .filter(|entry| entry.speaker == Speaker::User && entry.turn_id.is_none()),
        };
        if let Some(entry) = existing {
            entry.text = text;
            return;
        }
        self.entries.push(TranscriptEntry {
            turn_id,
            speaker: Speaker::User,
            text,
        });
    }
}
