//! Yuki: a conversational gateway in front of a local text-generation
//! server.
//!
//! This facade loads [`YukiConfig`], wires the dispatcher
//! ([`yuki_inference`]), the session store ([`yuki_storage`] /
//! [`yuki_database`]) and the rate limiter ([`yuki_rate_limit`]) into one
//! [`Yuki`] value, and sets up logging.
//!
//! # Example
//!
//! ```rust,no_run
//! use yuki::{Yuki, YukiConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = YukiConfig::load()?;
//!     init_telemetry(&config.logging, false)?;
//!
//!     let yuki = Yuki::from_config(config)?;
//!     let reply = yuki.chat("session-1", "Be brief.", "hello").await?;
//!     println!("{}", reply.text());
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod app;
mod config;
mod telemetry;

pub use app::{PreparedTurn, Yuki, open_store};
pub use config::{LogFormat, LoggingConfig, YukiConfig, environment};
pub use telemetry::init_telemetry;

pub use yuki_core::{ChatMessage, ChatTurn, GenerationRequest, Role, SessionState, estimate_tokens};
pub use yuki_error::{
    ConfigError, GatewayError, GatewayErrorKind, StorageError, StorageErrorKind, YukiError,
    YukiErrorKind, YukiResult,
};
pub use yuki_inference::{
    ApiMode, Endpoint, GenerationResult, HealthReport, InferenceClient, InferenceConfig,
    RetryPolicy, TokenStream,
};
pub use yuki_rate_limit::{RateLimitConfig, RateLimitDecision, SlidingWindowLimiter};
pub use yuki_storage::{MemorySessionStore, SessionStore, StorageBackend, StorageConfig};
pub use yuki_database::SqliteSessionStore;
