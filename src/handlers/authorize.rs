//! Session authorization proxy.
//!
//! Browsers must never hold the platform API key, so the client asks this
//! endpoint for a session token and the server attaches the key on its
//! behalf. The platform's successful response is relayed verbatim.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::info;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Platform endpoint that mints client session tokens.
const AUTHORIZE_PATH: &str = "/v1/agents/web/authorize_session";

pub async fn authorize_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> AppResult<Response> {
    let api_key = state.config.platform_api_key()?;

    let agent_id = body
        .get("agent_id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            AppError::Config("agent_id is missing from the authorization request".to_string())
        })?;
    info!(%agent_id, "authorizing client session");

    let response = state
        .http_client
        .post(format!("{}{AUTHORIZE_PATH}", state.config.platform_url))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .map_err(|err| AppError::Upstream(format!("authorization request failed: {err}")))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| AppError::Upstream(format!("authorization response unreadable: {err}")))?;

    if !status.is_success() {
        let message = extract_platform_error(&text)
            .unwrap_or_else(|| format!("authorization failed with status {status}"));
        return Err(AppError::from_upstream(message));
    }

    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        text,
    )
        .into_response())
}

/// Pull the human-readable message out of a platform error body, which is
/// either `{"error": "…"}` or `{"error": {"message": "…"}}`.
fn extract_platform_error(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    if let Some(message) = error.as_str() {
        return Some(message.to_string());
    }
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
