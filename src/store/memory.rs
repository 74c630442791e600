//! In-process conversation log backend.
//!
//! Development fallback for running without Redis. `DashMap` keeps appends to
//! the same key free of data races, but nothing here survives a restart and
//! entries never expire. Not a durability substitute.

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::conversation::Message;

#[derive(Clone, Default)]
pub struct MemoryBackend {
    logs: Arc<DashMap<String, Vec<Message>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, conversation_id: &str) -> Vec<Message> {
        self.logs
            .get(conversation_id)
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    pub fn append(&self, conversation_id: &str, messages: &[Message]) {
        self.logs
            .entry(conversation_id.to_string())
            .or_default()
            .extend_from_slice(messages);
    }

    pub fn reset(&self, conversation_id: &str) {
        self.logs.remove(conversation_id);
    }
}
