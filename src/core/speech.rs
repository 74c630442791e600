//! SSE response stream for speech playback.
//!
//! Webhook handlers reply with a `text/event-stream` body carrying
//! `response.tts` frames for each content delta and a terminal `response.end`
//! frame. `SpeechStream` owns the sending half; the response body drains the
//! channel, so the HTTP response stays open exactly as long as the handle
//! (or the task it was moved into) is alive.

use axum::body::Body;
use axum::http::{StatusCode, header};
use bytes::Bytes;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Frames emitted on the webhook response stream.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum SpeechFrame {
    #[serde(rename = "response.tts")]
    Tts { content: String, turn_id: String },

    #[serde(rename = "response.end")]
    End { turn_id: String },
}

/// Sending half of an open speech response.
pub struct SpeechStream {
    tx: mpsc::Sender<Bytes>,
    turn_id: String,
}

impl SpeechStream {
    /// Open a stream for one turn, returning the handle and the HTTP
    /// response whose body drains it.
    pub fn open(turn_id: impl Into<String>) -> (Self, Response) {
        let (tx, mut rx) = mpsc::channel::<Bytes>(32);

        let body = Body::from_stream(async_stream::stream! {
            while let Some(chunk) = rx.recv().await {
                yield Ok::<Bytes, std::convert::Infallible>(chunk);
            }
        });

        let response = (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
            ],
            body,
        )
            .into_response();

        let stream = Self {
            tx,
            turn_id: turn_id.into(),
        };
        (stream, response)
    }

    /// Emit one `response.tts` frame.
    pub async fn speak(&self, content: impl Into<String>) {
        let frame = SpeechFrame::Tts {
            content: content.into(),
            turn_id: self.turn_id.clone(),
        };
        self.send(&frame).await;
    }

    /// Emit the terminal `response.end` frame, consuming the handle.
    pub async fn finish(self) {
        let frame = SpeechFrame::End {
            turn_id: self.turn_id.clone(),
        };
        self.send(&frame).await;
    }

    async fn send(&self, frame: &SpeechFrame) {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(err) => {
                debug!(%err, "failed to serialize speech frame");
                return;
            }
        };
        let payload = Bytes::from(format!("data: {json}\n\n"));
        // A send error means the client disconnected; the turn is over either way.
        if self.tx.send(payload).await.is_err() {
            debug!(turn_id = %self.turn_id, "speech stream receiver dropped");
        }
    }
}
