//! Voxhook: a webhook gateway for voice agents.
//!
//! The gateway verifies and routes webhook events from a voice platform,
//! keeps per-conversation message logs in Redis (or in process when Redis is
//! not configured), streams generated replies back as speech frames, and
//! authorizes browser sessions without exposing the platform API key.

pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use errors::{AppError, AppResult};
pub use state::AppState;
