//! API route table.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, authorize, webhook};
use crate::state::AppState;

/// Build the API router. State is attached by the caller.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/agent", post(webhook::agent_webhook))
        .route("/authorize", post(authorize::authorize_session))
        .layer(TraceLayer::new_for_http())
}
