//! Row types for the session database.

use crate::schema::{messages, sessions};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::str::FromStr;
use yuki_core::{ChatMessage, Role};
use yuki_error::{StorageError, StorageErrorKind, StorageResult};

/// A stored history message.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MessageRow {
    /// Auto-increment id, monotonic in append order
    pub id: i64,
    /// Owning session
    pub session_id: String,
    /// Role name (`system`, `user` or `assistant`)
    pub role: String,
    /// Message text
    pub content: String,
    /// Unix timestamp in seconds
    pub ts: f64,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StorageError;

    fn try_from(row: MessageRow) -> StorageResult<Self> {
        let role = Role::from_str(&row.role)
            .map_err(|_| StorageError::new(StorageErrorKind::InvalidRole(row.role.clone())))?;
        Ok(ChatMessage::new(role, row.content, from_unix_seconds(row.ts)))
    }
}

/// Message insert.
#[derive(Debug, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessageRow<'a> {
    /// Owning session
    pub session_id: &'a str,
    /// Role name
    pub role: &'a str,
    /// Message text
    pub content: &'a str,
    /// Unix timestamp in seconds
    pub ts: f64,
}

/// Session insert.
#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSessionRow<'a> {
    /// Session id
    pub session_id: &'a str,
    /// JSON-encoded `SessionState`
    pub state_json: String,
    /// Unix timestamp in seconds
    pub created_at: f64,
    /// Unix timestamp in seconds
    pub updated_at: f64,
}

pub(crate) fn unix_now() -> f64 {
    to_unix_seconds(Utc::now())
}

pub(crate) fn to_unix_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

pub(crate) fn from_unix_seconds(ts: f64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros((ts * 1_000_000.0).round() as i64).unwrap_or_default()
}
