//! SQLite connection utilities.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::path::Path;
use yuki_error::{StorageError, StorageErrorKind, StorageResult};

const CONNECTION_PRAGMAS: &str = "
    PRAGMA busy_timeout = 5000;
    PRAGMA synchronous = NORMAL;
";

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    CREATE TABLE IF NOT EXISTS sessions (
        session_id TEXT PRIMARY KEY,
        state_json TEXT NOT NULL,
        created_at REAL NOT NULL,
        updated_at REAL NOT NULL
    );
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        ts REAL NOT NULL,
        FOREIGN KEY(session_id) REFERENCES sessions(session_id)
    );
    CREATE INDEX IF NOT EXISTS idx_messages_session_id ON messages(session_id);
";

/// Open a connection to the database file at `path`.
///
/// Each connection waits up to five seconds on a locked database before
/// failing, and runs with `synchronous = NORMAL`.
///
/// # Errors
///
/// Returns an error if the path is not valid UTF-8 or the file cannot be
/// opened.
pub fn establish_connection(path: &Path) -> StorageResult<SqliteConnection> {
    let url = path.to_str().ok_or_else(|| {
        StorageError::new(StorageErrorKind::Connection(format!(
            "database path is not valid UTF-8: {}",
            path.display()
        )))
    })?;

    let mut conn = SqliteConnection::establish(url)?;
    conn.batch_execute(CONNECTION_PRAGMAS)?;
    Ok(conn)
}

/// Create the tables and index if they do not exist, and switch the file to
/// write-ahead logging.
pub fn initialize_schema(conn: &mut SqliteConnection) -> StorageResult<()> {
    conn.batch_execute(SCHEMA)?;
    Ok(())
}
