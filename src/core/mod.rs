//! Domain types and conversation machinery.

pub mod conversation;
pub mod events;
pub mod llm;
pub mod prompt;
pub mod speech;
pub mod transcript;
