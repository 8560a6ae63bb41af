//! Durable session storage on SQLite.
//!
//! [`SqliteSessionStore`] implements [`yuki_storage::SessionStore`] over a
//! single database file with two tables, `sessions` and `messages`. The file
//! runs in write-ahead-log mode so readers proceed while a writer commits.
//! Every operation opens its own connection and commits before returning.
//!
//! # Example
//!
//! ```rust,no_run
//! use yuki_core::Role;
//! use yuki_database::SqliteSessionStore;
//! use yuki_storage::SessionStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteSessionStore::open("./yuki.sqlite3")?;
//! store.append_message("s1", Role::User, "hi", 20).await?;
//! let history = store.get_history("s1", 20).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod connection;
mod models;
mod store;

pub mod schema;

pub use connection::{establish_connection, initialize_schema};
pub use models::{MessageRow, NewMessageRow, NewSessionRow};
pub use store::SqliteSessionStore;
