//! Configuration for the upstream inference server connection.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use yuki_error::ConfigError;

const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which upstream endpoint a call uses.
///
/// Selected once per call. `Auto` tries the message-array endpoint first and
/// falls back to the single-prompt endpoint only when the server reports the
/// message-array endpoint as absent.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiMode {
    /// Always use the single-prompt endpoint
    #[default]
    Generate,
    /// Always use the message-array endpoint
    Chat,
    /// Message-array endpoint with single-prompt fallback
    Auto,
}

/// Connection and retry settings for the inference server.
///
/// Deserialized from the `[inference]` section of `yuki.toml`, or built in
/// code:
///
/// ```
/// use yuki_inference::{ApiMode, InferenceConfigBuilder};
///
/// let config = InferenceConfigBuilder::default()
///     .base_url("http://127.0.0.1:11434")
///     .api_mode(ApiMode::Auto)
///     .retry_max_attempts(5u32)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "yuki:latest");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct InferenceConfig {
    /// Server root, e.g. `http://127.0.0.1:11434`
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Endpoint selection
    pub api_mode: ApiMode,
    /// Per-request timeout in seconds
    pub timeout_secs: f64,
    /// Total tries per logical call, at least 1
    pub retry_max_attempts: u32,
    /// Base of the exponential backoff in seconds
    pub retry_backoff_base: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "yuki:latest".to_string(),
            api_mode: ApiMode::default(),
            timeout_secs: 120.0,
            retry_max_attempts: 3,
            retry_backoff_base: 0.5,
        }
    }
}

impl InferenceConfig {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::from_secs(120))
    }

    /// Connection timeout: the request timeout, capped at ten seconds.
    pub fn connect_timeout(&self) -> Duration {
        self.timeout().min(MAX_CONNECT_TIMEOUT)
    }

    /// Backoff base as a duration.
    pub fn backoff_base(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_backoff_base).unwrap_or_default()
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Check the configuration for values the client cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::new("inference.base_url must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::new("inference.model must not be empty"));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::new("inference.timeout_secs must be > 0"));
        }
        if Duration::try_from_secs_f64(self.timeout_secs).is_err() {
            return Err(ConfigError::new(format!(
                "inference.timeout_secs is out of range: {}",
                self.timeout_secs
            )));
        }
        if self.retry_max_attempts < 1 {
            return Err(ConfigError::new("inference.retry_max_attempts must be >= 1"));
        }
        if Duration::try_from_secs_f64(self.retry_backoff_base).is_err() {
            return Err(ConfigError::new(
                "inference.retry_backoff_base must be a non-negative number of seconds",
            ));
        }
        Ok(())
    }
}
