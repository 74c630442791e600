//! Chat-completions client with incremental token streaming.
//!
//! The request is issued with `stream: true` and the provider's SSE body is
//! folded into a stream of content deltas. The response status is checked
//! before the token stream is handed out, so provider rejections (including
//! balance exhaustion) surface as plain errors to the caller rather than as
//! mid-stream failures.

use std::pin::Pin;
use std::time::Duration;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tracing::debug;

use super::messages::{ChatChunk, ChatMessage, ChatRequest, extract_error_message};
use crate::config::ServerConfig;
use crate::core::conversation::Message;

/// Connect timeout for the provider. No total request timeout is set: the
/// platform's own webhook deadline bounds the generation call.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("voxhook/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("chat completion request failed: {0}")]
    Network(String),

    /// Provider responded with a non-2xx status; the message carries the
    /// provider's own error text.
    #[error("{0}")]
    Upstream(String),
}

/// Stream of generated content deltas.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

#[derive(Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| LlmError::Configuration(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, LlmError> {
        Self::new(
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        )
    }

    /// Issue a streaming generation call over the full conversation history.
    ///
    /// The returned stream yields content deltas as they arrive; the caller
    /// forwards them and accumulates the reply.
    pub async fn stream_chat(
        &self,
        system_prompt: &str,
        history: &[Message],
    ) -> Result<TokenStream, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage {
            role: "system",
            content: system_prompt.to_string(),
        });
        messages.extend(history.iter().map(|message| ChatMessage {
            role: message.role.as_str(),
            content: message.text(),
        }));

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| LlmError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream(extract_error_message(status, &body)));
        }

        let mut bytes = response.bytes_stream();
        let stream = try_stream! {
            let mut buffer = SseBuffer::default();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|err| LlmError::Network(err.to_string()))?;
                buffer.push(&chunk);

                while let Some(frame) = buffer.next_frame() {
                    for line in frame.lines() {
                        let Some(data) = line.strip_prefix("data:") else {
                            continue;
                        };
                        let data = data.trim();
                        if data == "[DONE]" {
                            return;
                        }
                        match serde_json::from_str::<ChatChunk>(data) {
                            Ok(parsed) => {
                                if let Some(content) = parsed.content()
                                    && !content.is_empty()
                                {
                                    yield content.to_string();
                                }
                            }
                            Err(err) => {
                                debug!(%err, "skipping unparseable completion chunk");
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Accumulates raw body bytes and hands out complete SSE frames.
///
/// Network chunks can split anywhere, including inside a multi-byte UTF-8
/// character, so the buffer stays `Vec<u8>` and framing happens on the ASCII
/// `\n\n` separator. Only complete frames are decoded to text, which keeps
/// split characters intact.
#[derive(Default)]
struct SseBuffer {
    bytes: Vec<u8>,
}

impl SseBuffer {
    fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    /// Next complete frame, decoded. `None` while the separator has not
    /// arrived yet.
    fn next_frame(&mut self) -> Option<String> {
        let boundary = self.bytes.windows(2).position(|pair| pair == b"\n\n")?;
        let frame: Vec<u8> = self.bytes.drain(..boundary + 2).collect();
        Some(String::from_utf8_lossy(&frame).into_owned())
    }
}
