//! Upstream request bodies.

use serde::Serialize;
use yuki_core::ChatTurn;

/// Body for the single-prompt endpoint (`/api/generate`).
#[derive(Debug, Clone, Serialize)]
pub struct GeneratePayload<'a> {
    /// Model identifier
    pub model: &'a str,
    /// System instructions
    pub system: &'a str,
    /// Rendered prompt
    pub prompt: &'a str,
    /// Request newline-delimited streaming output
    pub stream: bool,
}

/// Body for the message-array endpoint (`/api/chat`).
#[derive(Debug, Clone, Serialize)]
pub struct ChatPayload<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Conversation turns, system turn first
    pub messages: &'a [ChatTurn],
    /// Request newline-delimited streaming output
    pub stream: bool,
}
