//! Top-level error wrapper types.

use crate::{ConfigError, JsonError, KeyPoolError, ProviderError, StorageError, TransportError};

/// This is the foundation error enum. Each Reelsmith crate converts its
/// domain errors into a variant here via `From`.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ConfigError, ReelsmithError};
///
/// let cfg_err = ConfigError::new("no keys configured");
/// let err: ReelsmithError = cfg_err.into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum ReelsmithErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Pack or duplicate-guard storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// External provider error
    #[from(ProviderError)]
    Provider(ProviderError),
    /// Credential key pool error
    #[from(KeyPoolError)]
    KeyPool(KeyPoolError),
    /// Upload transport error
    #[from(TransportError)]
    Transport(TransportError),
}

/// Reelsmith error with kind discrimination.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ConfigError, ReelsmithResult};
///
/// fn might_fail() -> ReelsmithResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Reelsmith Error: {}", _0)]
pub struct ReelsmithError(Box<ReelsmithErrorKind>);

impl ReelsmithError {
    /// Create a new error from a kind.
    pub fn new(kind: ReelsmithErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ReelsmithErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to ReelsmithErrorKind
impl<T> From<T> for ReelsmithError
where
    T: Into<ReelsmithErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Reelsmith operations.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ReelsmithResult, StorageError, StorageErrorKind};
///
/// fn read_manifest() -> ReelsmithResult<String> {
///     Err(StorageError::new(StorageErrorKind::NotFound("20260829".into())))?
/// }
/// ```
pub type ReelsmithResult<T> = std::result::Result<T, ReelsmithError>;
