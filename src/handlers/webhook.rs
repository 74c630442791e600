//! Agent webhook: signature verification, event routing, speech streaming.
//!
//! Every delivery is verified against the raw body before decoding. The user
//! utterance is appended to the conversation log for every event type, so
//! turn ordering stays uniform; only `session.start` and `message` produce a
//! speech response, the other events are acknowledged with a bare 200.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, error, info};

use crate::core::conversation::Message;
use crate::core::events::WebhookEvent;
use crate::core::llm::TokenStream;
use crate::core::speech::SpeechStream;
use crate::errors::{AppError, AppResult};
use crate::middleware::{SIGNATURE_HEADER, verify};
use crate::state::AppState;

pub async fn agent_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let secret = state.config.webhook_secret()?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;
    if !verify(secret, &body, signature) {
        return Err(AppError::Unauthorized(
            "webhook signature mismatch".to_string(),
        ));
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| AppError::BadRequest(format!("malformed webhook event: {err}")))?;

    let payload = event.payload();
    info!(
        event = event.kind(),
        conversation_id = %payload.conversation_id,
        turn_id = %payload.turn_id,
        "webhook event received"
    );

    // A new session invalidates whatever history the conversation id carries.
    if matches!(event, WebhookEvent::SessionStart(_)) {
        state.store.reset(&payload.conversation_id).await?;
    }

    let user_message = Message::user(&payload.conversation_id, &payload.turn_id, &payload.text);
    state
        .store
        .append(&payload.conversation_id, std::slice::from_ref(&user_message))
        .await?;

    match event {
        WebhookEvent::SessionStart(payload) => {
            let welcome = state.config.welcome_message.clone();
            state
                .store
                .append(
                    &payload.conversation_id,
                    &[Message::assistant(&payload.conversation_id, &welcome)],
                )
                .await?;

            let (stream, response) = SpeechStream::open(payload.turn_id);
            tokio::spawn(async move {
                stream.speak(welcome).await;
                stream.finish().await;
            });
            Ok(response)
        }
        WebhookEvent::Message(payload) => {
            let history = state.store.get(&payload.conversation_id).await?;

            // The generation request is issued before the response stream is
            // committed, so provider rejections still map to a plain status.
            let tokens = state
                .llm
                .stream_chat(&state.system_prompt, &history)
                .await?;

            let (stream, response) = SpeechStream::open(payload.turn_id.clone());
            let store = state.store.clone();
            tokio::spawn(async move {
                if let Some(reply) =
                    relay_tokens(tokens, &stream, &payload.conversation_id, &payload.turn_id).await
                    && let Err(err) = store
                        .append(
                            &payload.conversation_id,
                            &[Message::assistant(&payload.conversation_id, reply)],
                        )
                        .await
                {
                    error!(
                        conversation_id = %payload.conversation_id,
                        %err,
                        "failed to record assistant reply"
                    );
                }

                stream.finish().await;
            });
            Ok(response)
        }
        WebhookEvent::SessionUpdate(payload) | WebhookEvent::SessionEnd(payload) => {
            debug!(
                conversation_id = %payload.conversation_id,
                "event acknowledged without response stream"
            );
            Ok(StatusCode::OK.into_response())
        }
    }
}

/// Forward generated tokens to the speech stream, accumulating the reply.
///
/// Returns the full reply text only when the stream completed cleanly. A
/// mid-turn failure discards whatever arrived so far: a truncated answer
/// must not be persisted as if it were the complete one, or later turns
/// would build on it as ground truth.
async fn relay_tokens(
    mut tokens: TokenStream,
    stream: &SpeechStream,
    conversation_id: &str,
    turn_id: &str,
) -> Option<String> {
    let mut reply = String::new();
    while let Some(token) = tokens.next().await {
        match token {
            Ok(content) => {
                reply.push_str(&content);
                stream.speak(content).await;
            }
            Err(err) => {
                error!(
                    %conversation_id,
                    %turn_id,
                    %err,
                    "generation stream failed mid-turn, discarding partial reply"
                );
                return None;
            }
        }
    }
    (!reply.is_empty()).then_some(reply)
}
