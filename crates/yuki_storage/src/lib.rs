//! Per-session conversational state and bounded message history.
//!
//! [`SessionStore`] is the capability the rest of the system depends on. This
//! crate ships the volatile [`MemorySessionStore`]; the durable SQLite store
//! lives in `yuki_database`. The backend is picked at startup from
//! [`StorageConfig`].
//!
//! # Example
//!
//! ```
//! use yuki_core::Role;
//! use yuki_storage::{MemorySessionStore, SessionStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemorySessionStore::new();
//! store.append_message("s1", Role::User, "hi", 20).await?;
//! store.append_message("s1", Role::Assistant, "hello!", 20).await?;
//!
//! let history = store.get_history("s1", 10).await?;
//! assert_eq!(history.len(), 2);
//! assert_eq!(store.get_state("s1").await?.mood(), "calm");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod memory;
mod store;

pub use config::{StorageBackend, StorageConfig};
pub use memory::MemorySessionStore;
pub use store::SessionStore;
pub use yuki_error::{StorageError, StorageErrorKind, StorageResult};
