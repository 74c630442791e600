//! Durable conversation log backend on Redis.
//!
//! One list per conversation, entries are JSON-serialized messages. `RPUSH`
//! gives atomic ordered appends under concurrent webhook invocations for the
//! same conversation; `EXPIRE` in the same pipeline refreshes the 12-hour TTL
//! on every append.

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{CONVERSATION_TTL_SECS, StoreError};
use crate::core::conversation::Message;

#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

fn log_key(conversation_id: &str) -> String {
    format!("conversation:{conversation_id}")
}

impl RedisBackend {
    /// Open a managed connection; the handshake is performed eagerly so a
    /// misconfigured URL is detected at startup, not on the first webhook.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }

    pub async fn get(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        let mut connection = self.connection.clone();
        let entries: Vec<String> = connection.lrange(log_key(conversation_id), 0, -1).await?;
        entries
            .iter()
            .map(|entry| serde_json::from_str(entry).map_err(StoreError::from))
            .collect()
    }

    pub async fn append(
        &self,
        conversation_id: &str,
        messages: &[Message],
    ) -> Result<(), StoreError> {
        let entries = messages
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let key = log_key(conversation_id);
        let mut connection = self.connection.clone();
        redis::pipe()
            .rpush(&key, entries)
            .ignore()
            .expire(&key, CONVERSATION_TTL_SECS)
            .ignore()
            .query_async::<()>(&mut connection)
            .await?;
        Ok(())
    }

    pub async fn reset(&self, conversation_id: &str) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        connection.del::<_, ()>(log_key(conversation_id)).await?;
        Ok(())
    }
}
