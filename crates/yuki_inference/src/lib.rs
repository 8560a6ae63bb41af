//! Request dispatch to a local text-generation server.
//!
//! [`InferenceClient`] is the dispatcher. It speaks the server's two
//! endpoints, a single-prompt endpoint (`/api/generate`) and a message-array
//! endpoint (`/api/chat`), and picks between them with [`ApiMode`]. Every
//! call goes through a [`RetryPolicy`]; streamed calls hand back a
//! [`TokenStream`] that relays newline-delimited JSON records as text
//! fragments and releases the connection when dropped.
//!
//! Failures reach the caller as a single [`GatewayError`] with a
//! machine-readable code. Retries and endpoint fallback never leak out.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use yuki_core::GenerationRequest;
//! use yuki_inference::{InferenceClient, InferenceConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InferenceClient::new(&InferenceConfig::default())?;
//! let request = GenerationRequest::from_history("Be brief.", &[], "hello");
//!
//! let result = client.complete_once(&request).await?;
//! println!("{} ({} ms)", result.text(), result.latency_ms());
//!
//! let mut stream = client.complete_streaming(&request).await?;
//! while let Some(fragment) = stream.next().await {
//!     print!("{}", fragment?);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod request;
mod response;
mod retry;
mod stream;

pub use client::InferenceClient;
pub use config::{ApiMode, InferenceConfig, InferenceConfigBuilder, InferenceConfigBuilderError};
pub use request::{ChatPayload, GeneratePayload};
pub use response::{Endpoint, GenerationResult, HealthReport};
pub use retry::{Disposition, RetryPolicy};
pub use stream::TokenStream;
pub use yuki_error::{GatewayError, GatewayErrorKind};
