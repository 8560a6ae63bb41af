//! Per-key admission control.
//!
//! [`SlidingWindowLimiter`] admits at most `per_minute` events per key in any
//! trailing window of `window_secs`. It is consulted before a request reaches
//! the session store or the inference server, typically keyed by client IP.
//!
//! ```
//! use yuki_rate_limit::{RateLimitConfig, SlidingWindowLimiter};
//!
//! let limiter = SlidingWindowLimiter::new(&RateLimitConfig::new(2, 60.0)).unwrap();
//! assert!(limiter.check("10.0.0.1").allowed);
//! assert!(limiter.check("10.0.0.1").allowed);
//! assert!(!limiter.check("10.0.0.1").allowed);
//! assert!(limiter.check("10.0.0.2").allowed);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod limiter;

pub use config::RateLimitConfig;
pub use error::{RateLimitError, RateLimitErrorKind};
pub use limiter::{RateLimitDecision, SlidingWindowLimiter};
