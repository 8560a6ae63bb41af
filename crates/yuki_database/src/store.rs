//! SQLite implementation of the session store.

use crate::connection::{establish_connection, initialize_schema};
use crate::models::{MessageRow, NewMessageRow, NewSessionRow, unix_now};
use crate::schema::{messages, sessions};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use yuki_core::{ChatMessage, Role, SessionState};
use yuki_error::{StorageError, StorageErrorKind, StorageResult};
use yuki_storage::SessionStore;

/// Durable session store on a single SQLite file.
///
/// Holds only the file path. Each operation runs on the blocking thread pool
/// with a fresh connection, and writes run inside an immediate transaction,
/// so a single call is atomic and committed before it returns. Separate
/// calls are not atomic as a group.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    path: PathBuf,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path`.
    ///
    /// Creates the parent directory if it is missing, then creates the schema
    /// and enables write-ahead logging.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened or initialized.
    #[instrument(skip(path))]
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let mut conn = establish_connection(&path)?;
        initialize_schema(&mut conn)?;

        info!(path = %path.display(), "Opened SQLite session store");
        Ok(Self { path })
    }

    /// Database file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` with a fresh connection on the blocking thread pool.
    async fn run<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> StorageResult<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = establish_connection(&path)?;
            op(&mut conn)
        })
        .await
        .map_err(|e| StorageError::new(StorageErrorKind::Task(e.to_string())))?
    }
}

/// Insert the default state row for `session_id` unless one exists.
fn ensure_session(conn: &mut SqliteConnection, session_id: &str) -> StorageResult<()> {
    let now = unix_now();
    diesel::insert_or_ignore_into(sessions::table)
        .values(&NewSessionRow {
            session_id,
            state_json: serde_json::to_string(&SessionState::default())?,
            created_at: now,
            updated_at: now,
        })
        .execute(conn)?;
    Ok(())
}

fn decode_state(session_id: &str, json: &str) -> SessionState {
    serde_json::from_str(json).unwrap_or_else(|e| {
        warn!(session_id, error = %e, "Stored session state is unreadable, using default");
        SessionState::default()
    })
}

fn as_sql_limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl SessionStore for SqliteSessionStore {
    #[instrument(skip(self))]
    async fn get_state(&self, session_id: &str) -> StorageResult<SessionState> {
        let session_id = session_id.to_string();
        self.run(move |conn| {
            conn.immediate_transaction::<_, StorageError, _>(|conn| {
                ensure_session(conn, &session_id)?;
                let json: String = sessions::table
                    .find(session_id.as_str())
                    .select(sessions::state_json)
                    .first(conn)?;
                Ok(decode_state(&session_id, &json))
            })
        })
        .await
    }

    #[instrument(skip(self, state))]
    async fn set_state(&self, session_id: &str, state: &SessionState) -> StorageResult<()> {
        let session_id = session_id.to_string();
        let state_json = serde_json::to_string(state)?;
        self.run(move |conn| {
            let now = unix_now();
            diesel::insert_into(sessions::table)
                .values(&NewSessionRow {
                    session_id: &session_id,
                    state_json: state_json.clone(),
                    created_at: now,
                    updated_at: now,
                })
                .on_conflict(sessions::session_id)
                .do_update()
                .set((
                    sessions::state_json.eq(&state_json),
                    sessions::updated_at.eq(now),
                ))
                .execute(conn)?;
            debug!("Session state replaced");
            Ok(())
        })
        .await
    }

    #[instrument(skip(self))]
    async fn get_history(&self, session_id: &str, limit: usize) -> StorageResult<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let session_id = session_id.to_string();
        self.run(move |conn| {
            let rows: Vec<MessageRow> = messages::table
                .filter(messages::session_id.eq(&session_id))
                .order(messages::id.desc())
                .limit(as_sql_limit(limit))
                .select(MessageRow::as_select())
                .load(conn)?;
            rows.into_iter().rev().map(ChatMessage::try_from).collect()
        })
        .await
    }

    #[instrument(skip(self, content), fields(content_len = content.len()))]
    async fn append_message(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
        max_history: usize,
    ) -> StorageResult<()> {
        let session_id = session_id.to_string();
        let content = content.to_string();
        let trimmed = self
            .run(move |conn| {
                conn.immediate_transaction::<_, StorageError, _>(|conn| {
                    ensure_session(conn, &session_id)?;

                    let now = unix_now();
                    diesel::insert_into(messages::table)
                        .values(&NewMessageRow {
                            session_id: &session_id,
                            role: role.as_ref(),
                            content: &content,
                            ts: now,
                        })
                        .execute(conn)?;

                    // Everything at or below the first id outside the newest
                    // `max_history` rows goes.
                    let mut trimmed = 0;
                    if max_history > 0 {
                        let cutoff: Option<i64> = messages::table
                            .filter(messages::session_id.eq(&session_id))
                            .order(messages::id.desc())
                            .select(messages::id)
                            .limit(1)
                            .offset(as_sql_limit(max_history))
                            .get_result(conn)
                            .optional()?;

                        if let Some(cutoff) = cutoff {
                            trimmed = diesel::delete(
                                messages::table
                                    .filter(messages::session_id.eq(&session_id))
                                    .filter(messages::id.le(cutoff)),
                            )
                            .execute(conn)?;
                        }
                    }

                    diesel::update(sessions::table.find(session_id.as_str()))
                        .set(sessions::updated_at.eq(now))
                        .execute(conn)?;
                    Ok(trimmed)
                })
            })
            .await?;

        debug!(trimmed, "Message appended");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}
