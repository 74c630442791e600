//! Server configuration.
//!
//! Loaded from environment variables (with `.env` support via `dotenvy`,
//! loaded in `main` before this runs). Secrets are zeroized on drop. Missing
//! secrets are not load errors: the webhook secret, platform API key and LLM
//! key are each validated at first use so the binary can run with a partial
//! configuration during development.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

use crate::errors::{AppError, AppResult};

/// Default persona for the generated voice replies.
pub const DEFAULT_PERSONA: &str = "You are a helpful voice assistant. Reply in short, \
     conversational sentences; the user hears your words as synthesized speech. Do not use \
     markdown, lists, or emoji.";

/// Assistant greeting spoken at session start.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hey! How can I help you today?";

const DEFAULT_PLATFORM_URL: &str = "https://api.layercode.com";
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Shared secret for webhook signature verification.
    pub webhook_secret: Option<String>,

    /// Server-held API key for the voice platform's authorization endpoint.
    pub platform_api_key: Option<String>,
    /// Voice platform base URL.
    pub platform_url: String,

    /// API key for the chat-completions provider.
    pub llm_api_key: Option<String>,
    /// Chat-completions base URL (OpenAI-compatible).
    pub llm_base_url: String,
    /// Model identifier sent with every generation call.
    pub llm_model: String,

    /// Durable conversation store URL. None selects the in-process backend.
    pub redis_url: Option<String>,

    // Agent behavior
    pub persona: String,
    pub welcome_message: String,
    /// Optional text file folded into the system prompt as knowledge base.
    pub knowledge_base_path: Option<PathBuf>,

    /// CORS allowed origins (comma-separated list or "*" for all).
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid(format!("PORT must be a number, got '{raw}'")))?,
            Err(_) => 8000,
        };

        let tls = match (optional_env("TLS_CERT_PATH"), optional_env("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            host,
            port,
            tls,
            webhook_secret: optional_env("LAYERCODE_WEBHOOK_SECRET"),
            platform_api_key: optional_env("LAYERCODE_API_KEY"),
            platform_url: optional_env("LAYERCODE_API_URL")
                .unwrap_or_else(|| DEFAULT_PLATFORM_URL.to_string()),
            llm_api_key: optional_env("OPENAI_API_KEY"),
            llm_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: optional_env("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            redis_url: optional_env("REDIS_URL"),
            persona: optional_env("AGENT_PERSONA").unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            welcome_message: optional_env("WELCOME_MESSAGE")
                .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()),
            knowledge_base_path: optional_env("KNOWLEDGE_BASE_PATH").map(PathBuf::from),
            cors_allowed_origins: optional_env("CORS_ALLOWED_ORIGINS"),
        })
    }

    /// Socket address string for binding.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Webhook signature secret, required at first webhook delivery.
    pub fn webhook_secret(&self) -> AppResult<&str> {
        self.webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::Config("LAYERCODE_WEBHOOK_SECRET is not set".to_string()))
    }

    /// Platform API key, required at first authorization request.
    pub fn platform_api_key(&self) -> AppResult<&str> {
        self.platform_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("LAYERCODE_API_KEY is not set".to_string()))
    }
}

/// Read an environment variable, treating empty values as unset.
fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Zeroize all secret fields when the config is dropped so sensitive data is
/// cleared from memory immediately after use.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut secret) = self.webhook_secret {
            secret.zeroize();
        }
        if let Some(ref mut key) = self.platform_api_key {
            key.zeroize();
        }
        if let Some(ref mut key) = self.llm_api_key {
            key.zeroize();
        }
    }
}
