//! Retry classification and backoff for upstream calls.

use crate::Endpoint;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};
use yuki_error::{GatewayError, GatewayErrorKind};

const MAX_HINTED_WAIT: Duration = Duration::from_secs(30);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
const MAX_JITTER_SECS: f64 = 0.1;

/// What to do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Sleep, then try the same endpoint again if the budget allows
    Retry,
    /// Stop at once; the caller may switch endpoints
    Fallback,
    /// Stop at once and surface the failure
    Fail,
}

impl Disposition {
    /// Classify a single attempt's failure.
    pub fn of(kind: &GatewayErrorKind) -> Self {
        match kind {
            GatewayErrorKind::EndpointNotFound(_) => Disposition::Fallback,
            GatewayErrorKind::Transient { .. }
            | GatewayErrorKind::UpstreamReported(_)
            | GatewayErrorKind::MalformedResponse(_) => Disposition::Retry,
            _ => Disposition::Fail,
        }
    }
}

/// Bounded retry with capped exponential backoff.
///
/// Attempts are numbered from 1 and at most `max_attempts` are made per
/// logical call. A server wait hint overrides the exponential delay.
///
/// ```
/// use std::time::Duration;
/// use yuki_inference::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(500));
/// assert_eq!(policy.backoff(1, Some(Duration::from_secs(2))), Duration::from_secs(2));
/// assert_eq!(policy.backoff(1, Some(Duration::from_secs(90))), Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` below 1 is raised to 1.
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// Total tries per logical call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the attempt following `attempt`, with random jitter.
    pub fn backoff(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.0..MAX_JITTER_SECS);
        self.backoff_with_jitter(attempt, retry_after, Duration::from_secs_f64(jitter))
    }

    /// Delay before the attempt following `attempt`, with the given jitter.
    ///
    /// A positive hint wins and is capped at 30 s. Otherwise the delay is
    /// `base * 2^(attempt - 1) + jitter`, capped at 10 s.
    pub fn backoff_with_jitter(
        &self,
        attempt: u32,
        retry_after: Option<Duration>,
        jitter: Duration,
    ) -> Duration {
        if let Some(hint) = retry_after.filter(|hint| !hint.is_zero()) {
            return hint.min(MAX_HINTED_WAIT);
        }
        let exponent = attempt.saturating_sub(1).min(30) as i32;
        let wait = self.backoff_base.as_secs_f64() * 2f64.powi(exponent) + jitter.as_secs_f64();
        Duration::try_from_secs_f64(wait)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }

    /// The terminal error for a call whose last retryable attempt failed.
    ///
    /// Network-level failures become `Unavailable`; everything else becomes
    /// `Exhausted`.
    #[track_caller]
    pub fn exhausted(&self, attempts: u32, last: &GatewayError) -> GatewayError {
        if last.kind.is_network() {
            GatewayError::new(GatewayErrorKind::Unavailable(last.detail()))
        } else {
            GatewayError::new(GatewayErrorKind::Exhausted {
                attempts,
                last: last.detail(),
            })
        }
    }

    /// Run `op` until it succeeds, fails terminally, or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, endpoint: Endpoint, mut op: F) -> Result<T, GatewayError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 1;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if Disposition::of(&err.kind) != Disposition::Retry {
                return Err(err);
            }

            if attempt >= self.max_attempts {
                let terminal = self.exhausted(attempt, &err);
                error!(
                    endpoint = %endpoint,
                    attempts = attempt,
                    code = terminal.code(),
                    "Retry budget exhausted: {}",
                    err.detail()
                );
                return Err(terminal);
            }

            let wait = self.backoff(attempt, retry_after(&err.kind));
            warn!(
                endpoint = %endpoint,
                attempt,
                max_attempts = self.max_attempts,
                wait_ms = wait.as_millis() as u64,
                status = ?status(&err.kind),
                code = err.code(),
                "Retrying upstream call: {}",
                err.detail()
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

fn retry_after(kind: &GatewayErrorKind) -> Option<Duration> {
    match kind {
        GatewayErrorKind::Transient { retry_after, .. } => *retry_after,
        _ => None,
    }
}

fn status(kind: &GatewayErrorKind) -> Option<u16> {
    match kind {
        GatewayErrorKind::Transient { status, .. } => *status,
        GatewayErrorKind::Http { status, .. } => Some(*status),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn transient(status: Option<u16>) -> GatewayError {
        GatewayError::new(GatewayErrorKind::Transient {
            status,
            retry_after: None,
            message: "boom".into(),
        })
    }

    #[test]
    fn test_hint_overrides_exponential() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        let hint = Some(Duration::from_secs(2));
        assert_eq!(
            policy.backoff_with_jitter(3, hint, Duration::from_millis(50)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_exponential_growth_and_cap() {
        let policy = RetryPolicy::new(10, Duration::from_millis(500));
        let none = Duration::ZERO;
        assert_eq!(policy.backoff_with_jitter(1, None, none), Duration::from_millis(500));
        assert_eq!(policy.backoff_with_jitter(2, None, none), Duration::from_secs(1));
        assert_eq!(policy.backoff_with_jitter(3, None, none), Duration::from_secs(2));
        assert_eq!(policy.backoff_with_jitter(6, None, none), Duration::from_secs(10));
        assert_eq!(policy.backoff_with_jitter(u32::MAX, None, none), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_hint_is_ignored() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(
            policy.backoff_with_jitter(1, Some(Duration::ZERO), Duration::ZERO),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_random_jitter_is_bounded() {
        let policy = RetryPolicy::new(3, Duration::from_millis(500));
        for _ in 0..100 {
            let wait = policy.backoff(1, None);
            assert!(wait >= Duration::from_millis(500));
            assert!(wait < Duration::from_millis(600));
        }
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            Disposition::of(&GatewayErrorKind::EndpointNotFound("/api/chat".into())),
            Disposition::Fallback
        );
        assert_eq!(Disposition::of(&transient(Some(503)).kind), Disposition::Retry);
        assert_eq!(
            Disposition::of(&GatewayErrorKind::UpstreamReported("x".into())),
            Disposition::Retry
        );
        assert_eq!(
            Disposition::of(&GatewayErrorKind::Http {
                status: 400,
                message: "bad".into()
            }),
            Disposition::Fail
        );
    }

    #[test]
    fn test_exhaustion_kind_follows_last_failure() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        assert_eq!(policy.exhausted(3, &transient(None)).code(), "unavailable");
        assert_eq!(policy.exhausted(3, &transient(Some(500))).code(), "retries_exhausted");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_after_budget() {
        let policy = RetryPolicy::new(4, Duration::from_millis(10));
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .run(Endpoint::Generate, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient(Some(500))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert!(matches!(
            result.unwrap_err().kind,
            GatewayErrorKind::Exhausted { attempts: 4, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_does_not_retry_fallback_or_terminal() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy
            .run(Endpoint::Chat, |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GatewayError::new(GatewayErrorKind::EndpointNotFound("/api/chat".into()))) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().code(), "endpoint_not_found");
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_recovers_after_transient_failures() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let result = policy
            .run(Endpoint::Generate, |attempt| async move {
                if attempt < 3 {
                    Err(transient(None))
                } else {
                    Ok(attempt)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
    }
}
