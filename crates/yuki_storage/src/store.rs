//! Session store trait definition.

use yuki_core::{ChatMessage, Role, SessionState};
use yuki_error::StorageResult;

/// Capability set shared by every session backend.
///
/// Each method is atomic on its own; there is no atomicity across calls. A
/// reader running between `set_state` and `append_message` may observe one
/// without the other, and concurrent read-modify-write sequences on the same
/// session resolve last-writer-wins.
///
/// Failures are not retried inside the store.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    /// Get the state for a session, creating the default state if the
    /// session has never been seen.
    async fn get_state(&self, session_id: &str) -> StorageResult<SessionState>;

    /// Replace the state for a session.
    async fn set_state(&self, session_id: &str, state: &SessionState) -> StorageResult<()>;

    /// Get at most `limit` of the most recent messages, oldest first.
    async fn get_history(&self, session_id: &str, limit: usize) -> StorageResult<Vec<ChatMessage>>;

    /// Append a message, then discard the oldest messages beyond the most
    /// recent `max_history`. A `max_history` of 0 disables trimming.
    async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        max_history: usize,
    ) -> StorageResult<()>;

    /// Backend name for logging (e.g., "memory", "sqlite").
    fn backend_name(&self) -> &'static str;
}
