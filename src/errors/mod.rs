//! Error types shared across the gateway.

pub mod app_error;

pub use app_error::{AppError, AppResult};
