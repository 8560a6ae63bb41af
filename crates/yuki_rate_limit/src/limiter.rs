//! Sliding-window limiter.

use crate::{RateLimitConfig, RateLimitError, RateLimitErrorKind};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitDecision {
    /// Whether the event was admitted (and recorded)
    pub allowed: bool,
    /// Seconds until the oldest retained event leaves the window; 0 when allowed
    pub retry_after_s: f64,
    /// Configured capacity per window
    pub limit: u32,
}

impl RateLimitDecision {
    /// Whole seconds suitable for a `Retry-After` header.
    ///
    /// Rounds up past the fractional remainder so a client that waits exactly
    /// this long is admitted.
    ///
    /// ```
    /// use yuki_rate_limit::RateLimitDecision;
    ///
    /// let denied = RateLimitDecision { allowed: false, retry_after_s: 12.4, limit: 3 };
    /// assert_eq!(denied.retry_after_header(), 13);
    /// ```
    pub fn retry_after_header(&self) -> u64 {
        self.retry_after_s.max(0.0).floor() as u64 + 1
    }
}

/// Per-key sliding-window admission control.
///
/// Each key owns a queue of admission instants. A check prunes instants older
/// than the window, denies when the remaining count has reached capacity, and
/// otherwise records the current instant. Pruning happens only inside
/// checks, for the checked key.
///
/// All keys share one lock; each check costs at most `per_minute` pops.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    per_minute: u32,
    window: Duration,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter from validated configuration.
    #[instrument(skip(config), fields(per_minute = config.per_minute, window_secs = config.window_secs))]
    pub fn new(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        config
            .validate()
            .map_err(|e| RateLimitError::new(RateLimitErrorKind::Config(e.message)))?;
        let window = Duration::try_from_secs_f64(config.window_secs)
            .map_err(|e| RateLimitError::new(RateLimitErrorKind::Config(e.to_string())))?;
        debug!("Creating sliding-window limiter");
        Ok(Self {
            per_minute: config.per_minute,
            window,
            hits: Mutex::new(HashMap::new()),
        })
    }

    /// Capacity per window.
    pub fn limit(&self) -> u32 {
        self.per_minute
    }

    /// Check and, if admitted, record an event for `key` now.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    /// Check and, if admitted, record an event for `key` at `now`.
    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = hits.entry(key.to_string()).or_default();

        while queue
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) > self.window)
        {
            queue.pop_front();
        }

        if queue.len() >= self.per_minute as usize {
            let retry_after = queue
                .front()
                .map(|oldest| {
                    self.window
                        .saturating_sub(now.saturating_duration_since(*oldest))
                })
                .unwrap_or(self.window);
            debug!(
                key,
                retained = queue.len(),
                retry_after_s = retry_after.as_secs_f64(),
                "Rate limit exceeded"
            );
            return RateLimitDecision {
                allowed: false,
                retry_after_s: retry_after.as_secs_f64(),
                limit: self.per_minute,
            };
        }

        queue.push_back(now);
        RateLimitDecision {
            allowed: true,
            retry_after_s: 0.0,
            limit: self.per_minute,
        }
    }

    /// Like [`check`](Self::check), but a denial becomes an error.
    pub fn enforce(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        let decision = self.check(key);
        if decision.allowed {
            Ok(decision)
        } else {
            Err(RateLimitError::new(RateLimitErrorKind::LimitExceeded {
                key: key.to_string(),
                retry_after_secs: decision.retry_after_header(),
            }))
        }
    }

    /// Number of keys with a window queue.
    pub fn tracked_keys(&self) -> usize {
        self.hits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
