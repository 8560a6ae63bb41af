//! Error types for the Yuki inference gateway.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - Constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use yuki_error::{GatewayError, GatewayErrorKind, YukiResult};
//!
//! fn dispatch() -> YukiResult<String> {
//!     Err(GatewayError::new(GatewayErrorKind::Unavailable("connection refused".into())))?
//! }
//!
//! match dispatch() {
//!     Ok(text) => println!("Got: {}", text),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod gateway;
mod storage;

pub use config::ConfigError;
pub use error::{YukiError, YukiErrorKind, YukiResult};
pub use gateway::{GatewayError, GatewayErrorKind};
pub use storage::{StorageError, StorageErrorKind, StorageResult};
