//! Top-level error wrapper types.

use crate::{ConfigError, GatewayError, StorageError};

/// Every failure the Yuki core can surface.
///
/// # Examples
///
/// ```
/// use yuki_error::{ConfigError, YukiError};
///
/// let err: YukiError = ConfigError::new("timeout must be > 0").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum YukiErrorKind {
    /// Inference gateway error
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Session storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Yuki error with kind discrimination.
///
/// # Examples
///
/// ```
/// use yuki_error::{ConfigError, YukiResult};
///
/// fn might_fail() -> YukiResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Yuki Error: {}", _0)]
pub struct YukiError(Box<YukiErrorKind>);

impl YukiError {
    /// Create a new error from a kind.
    pub fn new(kind: YukiErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &YukiErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to YukiErrorKind
impl<T> From<T> for YukiError
where
    T: Into<YukiErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Yuki operations.
pub type YukiResult<T> = std::result::Result<T, YukiError>;
