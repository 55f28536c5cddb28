//! Key pool error types.

/// Kinds of key pool errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum KeyPoolErrorKind {
    /// Every key in the pool is marked exhausted
    #[display("No usable keys available for provider '{}'", _0)]
    NoKeysAvailable(String),
    /// The pool was constructed without any keys
    #[display("Key pool for provider '{}' is empty", _0)]
    EmptyPool(String),
    /// A reported key id is not a member of the pool
    #[display("Unknown key id: {}", _0)]
    UnknownKey(String),
}

/// Key pool error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{KeyPoolError, KeyPoolErrorKind};
///
/// let err = KeyPoolError::new(KeyPoolErrorKind::NoKeysAvailable("gemini".to_string()));
/// assert!(format!("{}", err).contains("No usable keys"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Key Pool Error: {} at line {} in {}", kind, line, file)]
pub struct KeyPoolError {
    /// The kind of error that occurred
    pub kind: KeyPoolErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl KeyPoolError {
    /// Create a new key pool error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: KeyPoolErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
