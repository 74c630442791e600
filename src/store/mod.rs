//! Conversation store with a durable (Redis) or in-process backend.
//!
//! The backend is selected once at startup: when `REDIS_URL` is configured
//! and the connection handshake succeeds the store is durable and entries
//! expire 12 hours after their last append; otherwise the store falls back to
//! an in-process map and a single warning is emitted for the lifetime of the
//! process. Callers see identical behavior from both backends apart from
//! durability and cross-process visibility.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::core::conversation::Message;

mod memory;
mod redis_backend;

pub use memory::MemoryBackend;
pub use redis_backend::RedisBackend;

/// Entry time-to-live on the durable backend, refreshed on every append.
pub const CONVERSATION_TTL_SECS: i64 = 12 * 60 * 60;

/// Conversation store I/O failure. Only the durable backend can fail; the
/// in-process backend is infallible.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation store error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("stored message is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Append-only per-conversation message log.
///
/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct ConversationStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Durable(RedisBackend),
    Memory(MemoryBackend),
}

impl ConversationStore {
    /// Select a backend from configuration. Never fails: an unreachable or
    /// unconfigured Redis falls back to the in-process map with one warning.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        match redis_url {
            Some(url) => match RedisBackend::connect(url).await {
                Ok(backend) => {
                    info!("conversation store using durable Redis backend");
                    Self {
                        backend: Backend::Durable(backend),
                    }
                }
                Err(err) => {
                    note_memory_fallback(&format!("redis unreachable: {err}"));
                    Self::in_memory()
                }
            },
            None => {
                note_memory_fallback("REDIS_URL not configured");
                Self::in_memory()
            }
        }
    }

    /// In-process backend, used directly by tests and as the fallback target.
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryBackend::new()),
        }
    }

    /// Ordered message log for a conversation. Empty when none exist.
    pub async fn get(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        match &self.backend {
            Backend::Durable(backend) => backend.get(conversation_id).await,
            Backend::Memory(backend) => Ok(backend.get(conversation_id)),
        }
    }

    /// Append messages in order. A no-op on empty input; the durable backend
    /// resets the entry TTL to 12 hours on every real append.
    pub async fn append(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        if messages.is_empty() {
            return Ok(());
        }
        match &self.backend {
            Backend::Durable(backend) => backend.append(conversation_id, messages).await,
            Backend::Memory(backend) => {
                backend.append(conversation_id, messages);
                Ok(())
            }
        }
    }

    /// Delete all messages for a conversation.
    pub async fn reset(&self, conversation_id: &str) -> Result<(), StoreError> {
        match &self.backend {
            Backend::Durable(backend) => backend.reset(conversation_id).await,
            Backend::Memory(backend) => {
                backend.reset(conversation_id);
                Ok(())
            }
        }
    }

    /// Whether the durable backend is active.
    pub fn is_durable(&self) -> bool {
        matches!(self.backend, Backend::Durable(_))
    }
}

/// Emit the fallback warning at most once per process. Returns whether this
/// call fired the warning, so the one-shot property is observable in tests.
fn note_memory_fallback(reason: &str) -> bool {
    static WARNED: AtomicBool = AtomicBool::new(false);
    if WARNED.swap(true, Ordering::Relaxed) {
        return false;
    }
    warn!(
        %reason,
        "durable conversation store unavailable, falling back to in-process memory backend \
         (no durability, single process only)"
    );
    true
}
