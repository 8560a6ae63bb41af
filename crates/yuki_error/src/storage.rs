//! Session storage error types.

/// Kinds of session storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to open the backing database
    #[display("Storage connection error: {}", _0)]
    Connection(String),
    /// Query execution failed
    #[display("Storage query error: {}", _0)]
    Query(String),
    /// Session state could not be encoded or decoded
    #[display("Serialization error: {}", _0)]
    Serialization(String),
    /// Failed to create the directory holding the database file
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// A stored role name is not recognised
    #[display("Invalid role: {}", _0)]
    InvalidRole(String),
    /// A blocking storage task failed to complete
    #[display("Storage task failed: {}", _0)]
    Task(String),
    /// Invalid storage configuration
    #[display("Invalid configuration: {}", _0)]
    InvalidConfig(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use yuki_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::InvalidRole("narrator".to_string()));
/// assert!(format!("{}", err).contains("narrator"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

/// Result type for session storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for StorageError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        StorageError::new(StorageErrorKind::Query(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for StorageError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        StorageError::new(StorageErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<serde_json::Error> for StorageError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        StorageError::new(StorageErrorKind::Serialization(err.to_string()))
    }
}
