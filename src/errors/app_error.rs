//! Request-level error type and HTTP mapping.
//!
//! All failures are caught at the handler boundary and converted to a status
//! plus a JSON `{"error": …}` body. No retries happen anywhere in the
//! gateway: a failed generation call or store operation fails the request.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::core::llm::LlmError;
use crate::store::StoreError;

/// Substring by which the platform and the LLM provider signal an exhausted
/// account balance. Promoted to HTTP 402 instead of 500.
const INSUFFICIENT_BALANCE: &str = "insufficient_balance";

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Webhook signature mismatch. Fatal for the request, no side effects.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed body or unknown event type. Fatal, no side effects.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Upstream authorization or generation service signaled an exhausted
    /// balance.
    #[error("{0}")]
    InsufficientBalance(String),

    /// Any other upstream authorization or generation failure.
    #[error("{0}")]
    Upstream(String),

    /// Missing required secret or key, detected at first use.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Classify an upstream failure message, promoting insufficient-balance
    /// signals to their own variant.
    pub fn from_upstream(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.contains(INSUFFICIENT_BALANCE) {
            Self::InsufficientBalance(message)
        } else {
            Self::Upstream(message)
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientBalance(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Upstream(_) | Self::Config(_) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Configuration(message) => Self::Config(message),
            LlmError::Network(message) => Self::Upstream(message),
            LlmError::Upstream(message) => Self::from_upstream(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        warn!(%status, error = %message, "request failed");
        (status, Json(json!({ "error": message }))).into_response()
    }
}
