//! Process-local session store.

use crate::SessionStore;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;
use yuki_core::{ChatMessage, Role, SessionState};
use yuki_error::StorageResult;

#[derive(Debug, Default)]
struct Sessions {
    states: HashMap<String, SessionState>,
    histories: HashMap<String, VecDeque<ChatMessage>>,
}

/// Volatile session store backed by in-process maps.
///
/// One lock guards every session, so operations on different sessions are
/// serialized too. Each operation is O(history length) and never awaits
/// while holding the lock. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Sessions>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        tracing::info!("Created in-memory session store");
        Self::default()
    }

    #[cfg(test)]
    async fn session_count(&self) -> usize {
        let sessions = self.inner.lock().await;
        sessions
            .histories
            .keys()
            .chain(sessions.states.keys().filter(|k| !sessions.histories.contains_key(*k)))
            .count()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    #[tracing::instrument(skip(self))]
    async fn get_state(&self, session_id: &str) -> StorageResult<SessionState> {
        let mut sessions = self.inner.lock().await;
        let state = sessions
            .states
            .entry(session_id.to_string())
            .or_default()
            .clone();
        Ok(state)
    }

    #[tracing::instrument(skip(self, state))]
    async fn set_state(&self, session_id: &str, state: &SessionState) -> StorageResult<()> {
        let mut sessions = self.inner.lock().await;
        sessions
            .states
            .insert(session_id.to_string(), state.clone());
        tracing::debug!(mood = %state.mood(), "Session state replaced");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn get_history(&self, session_id: &str, limit: usize) -> StorageResult<Vec<ChatMessage>> {
        let sessions = self.inner.lock().await;
        let Some(history) = sessions.histories.get(session_id) else {
            return Ok(Vec::new());
        };
        let skip = history.len().saturating_sub(limit);
        Ok(history.iter().skip(skip).cloned().collect())
    }

    #[tracing::instrument(skip(self, content), fields(content_len = content.len()))]
    async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        max_history: usize,
    ) -> StorageResult<()> {
        let mut sessions = self.inner.lock().await;
        let history = sessions
            .histories
            .entry(session_id.to_string())
            .or_default();
        history.push_back(ChatMessage::now(role, content));

        if max_history > 0 {
            while history.len() > max_history {
                history.pop_front();
            }
        }
        tracing::debug!(stored = history.len(), "Message appended");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
