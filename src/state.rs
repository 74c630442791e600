//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{ConfigError, ServerConfig};
use crate::core::llm::LlmClient;
use crate::core::prompt::build_system_prompt;
use crate::store::ConversationStore;

/// State shared across all request handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub store: ConversationStore,
    pub llm: LlmClient,
    /// Pooled client for server-to-platform calls.
    pub http_client: reqwest::Client,
    /// System prompt assembled once at startup from persona + knowledge base.
    pub system_prompt: String,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Result<Arc<Self>, ConfigError> {
        let knowledge_base = match &config.knowledge_base_path {
            Some(path) => {
                let text = tokio::fs::read_to_string(path).await.map_err(|err| {
                    ConfigError::Invalid(format!(
                        "failed to read knowledge base {}: {err}",
                        path.display()
                    ))
                })?;
                info!(path = %path.display(), bytes = text.len(), "loaded knowledge base");
                Some(text)
            }
            None => None,
        };
        let system_prompt = build_system_prompt(&config.persona, knowledge_base.as_deref());

        let store = ConversationStore::connect(config.redis_url.as_deref()).await;

        let llm = LlmClient::from_config(&config)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                ConfigError::Invalid(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Arc::new(Self {
            config,
            store,
            llm,
            http_client,
            system_prompt,
        }))
    }
}
