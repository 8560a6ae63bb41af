//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the yuki binary.

mod chat;
mod commands;
mod session;

pub use chat::{handle_chat, handle_health};
pub use commands::{Cli, Commands};
pub use session::{handle_history, handle_state};

/// A session id from the command line, or a fresh v4 UUID.
pub fn session_or_new(session: Option<String>) -> String {
    session
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
