//! Inference gateway error types.
//!
//! Every failure the dispatcher can produce is one of these kinds. Local
//! recovery (retry, endpoint fallback) happens inside the dispatcher; only the
//! final classified outcome reaches callers, as a [`GatewayError`] carrying a
//! machine-readable [`code`](GatewayErrorKind::code) and a human-readable
//! [`detail`](GatewayError::detail).

use std::time::Duration;

/// Gateway error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GatewayErrorKind {
    /// The upstream server does not implement the endpoint (HTTP 404).
    #[display("Endpoint not found: {}", _0)]
    EndpointNotFound(String),

    /// A single attempt failed in a way that may succeed later.
    ///
    /// `status` is `None` for network-level failures (timeout, refused
    /// connection); `retry_after` carries the server's wait hint when present.
    #[display("Transient failure (status {:?}): {}", status, message)]
    Transient {
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// Server-supplied wait hint (`Retry-After`)
        retry_after: Option<Duration>,
        /// Description of the failure
        message: String,
    },

    /// The upstream returned a payload carrying an explicit error field.
    #[display("Upstream reported error: {}", _0)]
    UpstreamReported(String),

    /// The upstream payload did not have the expected shape.
    #[display("Malformed response: {}", _0)]
    MalformedResponse(String),

    /// Non-retryable HTTP status.
    #[display("HTTP {} error: {}", status, message)]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// Network failures persisted through the whole retry budget.
    #[display("Inference server unavailable: {}", _0)]
    Unavailable(String),

    /// The retry budget was spent without a successful attempt.
    #[display("Request failed after {} attempts: {}", attempts, last)]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Description of the final attempt's failure
        last: String,
    },

    /// An open stream failed after it started relaying.
    #[display("Stream error: {}", _0)]
    Stream(String),

    /// Invalid gateway configuration.
    #[display("Configuration error: {}", _0)]
    Configuration(String),
}

impl GatewayErrorKind {
    /// Machine-readable code for this condition.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayErrorKind::EndpointNotFound(_) => "endpoint_not_found",
            GatewayErrorKind::Transient { .. } => "transient",
            GatewayErrorKind::UpstreamReported(_) => "upstream_error",
            GatewayErrorKind::MalformedResponse(_) => "malformed_response",
            GatewayErrorKind::Http { .. } => "http_error",
            GatewayErrorKind::Unavailable(_) => "unavailable",
            GatewayErrorKind::Exhausted { .. } => "retries_exhausted",
            GatewayErrorKind::Stream(_) => "stream_error",
            GatewayErrorKind::Configuration(_) => "configuration_error",
        }
    }

    /// True for network-level failures where no response was received.
    pub fn is_network(&self) -> bool {
        matches!(self, GatewayErrorKind::Transient { status: None, .. })
    }
}

/// Gateway error with source location tracking.
///
/// # Examples
///
/// ```
/// use yuki_error::{GatewayError, GatewayErrorKind};
///
/// let err = GatewayError::new(GatewayErrorKind::EndpointNotFound("/api/chat".into()));
/// assert_eq!(err.code(), "endpoint_not_found");
/// assert!(err.detail().contains("/api/chat"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    /// The kind of error that occurred
    pub kind: GatewayErrorKind,
    /// Line number where the error was created
    pub line: u32,
    /// File where the error was created
    pub file: &'static str,
}

impl GatewayError {
    /// Create a new GatewayError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Human-readable description without location information.
    pub fn detail(&self) -> String {
        self.kind.to_string()
    }
}
