//! HTTP request handlers.

pub mod api;
pub mod authorize;
pub mod webhook;
