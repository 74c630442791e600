//! Service metadata endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Health and identity probe.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok",
    }))
}
