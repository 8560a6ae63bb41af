//! Component wiring.

use crate::YukiConfig;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use yuki_core::{GenerationRequest, Role, SessionState};
use yuki_database::SqliteSessionStore;
use yuki_error::{ConfigError, YukiResult};
use yuki_inference::{GenerationResult, InferenceClient};
use yuki_rate_limit::{RateLimitDecision, SlidingWindowLimiter};
use yuki_storage::{MemorySessionStore, SessionStore, StorageBackend, StorageConfig};

/// Open the session backend named by the configuration.
#[instrument(skip(config), fields(backend = %config.storage))]
pub fn open_store(config: &StorageConfig) -> YukiResult<Arc<dyn SessionStore>> {
    let store: Arc<dyn SessionStore> = match config.storage {
        StorageBackend::Memory => Arc::new(MemorySessionStore::new()),
        StorageBackend::Sqlite => Arc::new(SqliteSessionStore::open(&config.sqlite_path)?),
    };
    Ok(store)
}

/// A turn ready to dispatch: the session's current state and the request
/// rendered from its history.
#[derive(Debug, Clone)]
pub struct PreparedTurn {
    /// State loaded for the session
    pub state: SessionState,
    /// Request built from history plus the new user input
    pub request: GenerationRequest,
}

/// The assembled gateway: dispatcher, session store and rate limiter.
///
/// Owns no global state. Routing layers hold one `Yuki` (behind an `Arc`)
/// and call into it per request.
pub struct Yuki {
    config: YukiConfig,
    client: InferenceClient,
    store: Arc<dyn SessionStore>,
    limiter: SlidingWindowLimiter,
}

impl std::fmt::Debug for Yuki {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Yuki")
            .field("config", &self.config)
            .field("store", &self.store.backend_name())
            .finish_non_exhaustive()
    }
}

impl Yuki {
    /// Build every component from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the session
    /// store cannot be opened.
    #[instrument(skip(config))]
    pub fn from_config(config: YukiConfig) -> YukiResult<Self> {
        config.validate()?;
        let client = InferenceClient::new(&config.inference)?;
        let store = open_store(&config.session)?;
        Self::from_parts(config, client, store)
    }

    /// Assemble from already-built components.
    pub fn from_parts(
        config: YukiConfig,
        client: InferenceClient,
        store: Arc<dyn SessionStore>,
    ) -> YukiResult<Self> {
        let limiter = SlidingWindowLimiter::new(&config.rate_limit)
            .map_err(|e| ConfigError::new(e.to_string()))?;
        info!(
            store = store.backend_name(),
            api_mode = %config.inference.api_mode,
            per_minute = limiter.limit(),
            "Yuki ready"
        );
        Ok(Self {
            config,
            client,
            store,
            limiter,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &YukiConfig {
        &self.config
    }

    /// The dispatcher.
    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    /// The session store.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// The rate limiter.
    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    /// Consult the rate limiter for `key`.
    pub fn admit(&self, key: &str) -> RateLimitDecision {
        self.limiter.check(key)
    }

    /// Load state and recent history and render the request for a new
    /// user message.
    #[instrument(skip(self, system, user_text))]
    pub async fn prepare_turn(
        &self,
        session_id: &str,
        system: &str,
        user_text: &str,
    ) -> YukiResult<PreparedTurn> {
        let state = self.store.get_state(session_id).await?;
        let history = self
            .store
            .get_history(session_id, self.config.session.max_history)
            .await?;
        debug!(history = history.len(), "Turn prepared");
        Ok(PreparedTurn {
            state,
            request: GenerationRequest::from_history(system, &history, user_text),
        })
    }

    /// Persist a finished turn: state first, then the user message, then the
    /// assistant reply.
    ///
    /// Each write is its own store call. A failure part-way leaves the earlier
    /// writes in place, and concurrent readers may see the steps one at a
    /// time.
    #[instrument(skip(self, state, user_text, assistant_text))]
    pub async fn record_turn(
        &self,
        session_id: &str,
        state: &SessionState,
        user_text: &str,
        assistant_text: &str,
    ) -> YukiResult<()> {
        let max_history = self.config.session.max_history;
        self.store.set_state(session_id, state).await?;
        self.store
            .append_message(session_id, Role::User, user_text, max_history)
            .await?;
        self.store
            .append_message(session_id, Role::Assistant, assistant_text, max_history)
            .await?;
        Ok(())
    }

    /// Run one complete non-streaming turn and record it.
    ///
    /// Nothing is recorded when the dispatch fails.
    #[instrument(skip(self, system, user_text))]
    pub async fn chat(
        &self,
        session_id: &str,
        system: &str,
        user_text: &str,
    ) -> YukiResult<GenerationResult> {
        let turn = self.prepare_turn(session_id, system, user_text).await?;
        let result = match self.client.complete_once(&turn.request).await {
            Ok(result) => result,
            Err(e) => {
                warn!(code = e.code(), "Dispatch failed: {}", e.detail());
                return Err(e.into());
            }
        };
        self.record_turn(session_id, &turn.state, user_text, result.text())
            .await?;
        Ok(result)
    }
}
