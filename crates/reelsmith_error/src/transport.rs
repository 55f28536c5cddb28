//! Upload transport error types.

use crate::RetryableError;

/// Kinds of upload transport errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum TransportErrorKind {
    /// OAuth token or credential expired
    #[display("Authentication expired: {}", _0)]
    AuthExpired(String),
    /// Upload quota exceeded for the day
    #[display("Upload quota exceeded: {}", _0)]
    QuotaExceeded(String),
    /// Transient failure (5xx, network) — retry next cycle
    #[display("Transient transport failure: {}", _0)]
    Transient(String),
    /// The video file to upload is missing
    #[display("Video file not found: {}", _0)]
    FileNotFound(String),
    /// The remote service rejected the upload permanently
    #[display("Upload rejected: {}", _0)]
    Rejected(String),
}

impl TransportErrorKind {
    /// Check if the failed slot should be retried on a later cycle.
    ///
    /// Quota and auth failures are expected to clear after the provider-side
    /// daily reset; a rejection or a missing video file will not, so those
    /// are permanent.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransportErrorKind::Rejected(_) | TransportErrorKind::FileNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_permanent() {
        assert!(!TransportErrorKind::FileNotFound("video.mp4".to_string()).is_retryable());
        assert!(!TransportErrorKind::Rejected("policy".to_string()).is_retryable());
        assert!(TransportErrorKind::Transient("503".to_string()).is_retryable());
        assert!(TransportErrorKind::QuotaExceeded("daily".to_string()).is_retryable());
    }
}

/// Transport error with location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{RetryableError, TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::Transient("503".to_string()));
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    /// The kind of error that occurred
    pub kind: TransportErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl TransportError {
    /// Create a new transport error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl RetryableError for TransportError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}
