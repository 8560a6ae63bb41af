//! Core data types for the Yuki inference gateway.
//!
//! This crate provides the types shared by the dispatcher, the session
//! stores and the facade: conversation roles and messages, generation
//! requests, and per-session state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod message;
mod request;
mod role;
mod state;
mod tokens;

pub use message::{ChatMessage, ChatTurn};
pub use request::GenerationRequest;
pub use role::Role;
pub use state::SessionState;
pub use tokens::estimate_tokens;
