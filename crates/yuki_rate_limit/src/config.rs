//! Rate limit configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use yuki_error::ConfigError;

/// Sliding-window limits applied per key.
///
/// Loaded from the `[rate_limit]` section of `yuki.toml`:
///
/// ```toml
/// [rate_limit]
/// per_minute = 60
/// window_secs = 60.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Events admitted per key within one window
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,

    /// Width of the trailing window in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: f64,
}

fn default_per_minute() -> u32 {
    60
}

fn default_window_secs() -> f64 {
    60.0
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
            window_secs: default_window_secs(),
        }
    }
}

impl RateLimitConfig {
    /// Create a configuration with explicit limits.
    pub fn new(per_minute: u32, window_secs: f64) -> Self {
        Self {
            per_minute,
            window_secs,
        }
    }

    /// Check that the limits describe a usable window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_minute == 0 {
            return Err(ConfigError::new("rate_limit.per_minute must be > 0"));
        }
        if !self.window_secs.is_finite() || self.window_secs <= 0.0 {
            return Err(ConfigError::new("rate_limit.window_secs must be > 0"));
        }
        if Duration::try_from_secs_f64(self.window_secs).is_err() {
            return Err(ConfigError::new(format!(
                "rate_limit.window_secs is out of range: {}",
                self.window_secs
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: RateLimitConfig = toml::from_str("per_minute = 5").unwrap();
        assert_eq!(config.per_minute, 5);
        assert_eq!(config.window_secs, 60.0);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        assert!(RateLimitConfig::new(0, 60.0).validate().is_err());
        assert!(RateLimitConfig::new(3, 0.0).validate().is_err());
        assert!(RateLimitConfig::new(3, f64::NAN).validate().is_err());
        assert!(RateLimitConfig::new(3, 60.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_window_beyond_duration_range() {
        assert!(RateLimitConfig::new(3, 1e20).validate().is_err());
        assert!(RateLimitConfig::new(3, f64::INFINITY).validate().is_err());
        assert!(RateLimitConfig::new(3, 86_400.0 * 365.0).validate().is_ok());
    }
}
