//! Streaming chat-completions client (OpenAI-compatible).

mod client;
mod messages;

pub use client::{LlmClient, LlmError, TokenStream};
pub use messages::{ChatMessage, ChatRequest};
