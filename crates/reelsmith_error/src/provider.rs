//! External provider error types and retry classification.

/// Provider-specific error conditions.
///
/// Every failure reported by an external collaborator (story source, rewrite,
/// speech synthesis, rendering) is classified into one of these kinds. The
/// classification drives key rotation and retry decisions in the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProviderErrorKind {
    /// Transient failure (network error, timeout, 5xx) — retry with backoff
    #[display("Transient provider failure: {}", _0)]
    Transient(String),
    /// Quota or credit exhaustion — rotate to the next credential key
    #[display("Provider quota exhausted: {}", _0)]
    QuotaExhausted(String),
    /// Authentication failure — the key is unusable until reset
    #[display("Provider authentication failed: {}", _0)]
    AuthFailed(String),
    /// Candidate rejected by provider policy — drop it and pick another
    #[display("Policy rejection: {}", _0)]
    PolicyReject(String),
    /// Rendering failed — fail the unit, keep artifacts for inspection
    #[display("Render failed: {}", _0)]
    Render(String),
    /// External call exceeded its bounded wait — treated as transient
    #[display("Provider call timed out after {}s", _0)]
    Timeout(u64),
}

impl ProviderErrorKind {
    /// Check if this error should be retried on the same key.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::Transient(_) | ProviderErrorKind::Timeout(_)
        )
    }

    /// Check if this error marks the current key exhausted.
    ///
    /// Quota and authentication failures deprioritize the key until the next
    /// daily reset; transient failures leave it selectable.
    pub fn exhausts_key(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::QuotaExhausted(_) | ProviderErrorKind::AuthFailed(_)
        )
    }

    /// Get retry strategy parameters for this error kind.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            ProviderErrorKind::Transient(_) => (1000, 3, 30),
            ProviderErrorKind::Timeout(_) => (2000, 3, 60),
            _ => (2000, 3, 60),
        }
    }
}

/// Provider error with source location tracking.
///
/// # Examples
///
/// ```
/// use reelsmith_error::{ProviderError, ProviderErrorKind, RetryableError};
///
/// let err = ProviderError::new(ProviderErrorKind::Transient("503".to_string()));
/// assert!(err.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provider Error: {} at line {} in {}", kind, line, file)]
pub struct ProviderError {
    /// The kind of error that occurred
    pub kind: ProviderErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProviderError {
    /// Create a new provider error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProviderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a transient failure.
    #[track_caller]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transient(message.into()))
    }

    /// Shorthand for a quota exhaustion failure.
    #[track_caller]
    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::QuotaExhausted(message.into()))
    }
}

/// Trait for errors that support retry logic.
///
/// Transient errors like 503 (service unavailable), 429 (rate limit), or
/// network timeouts should return true. Permanent errors like policy
/// rejections should return false.
pub trait RetryableError {
    /// Returns true if this error should trigger a retry.
    fn is_retryable(&self) -> bool;

    /// Get retry strategy parameters for this error.
    ///
    /// Returns `(initial_backoff_ms, max_retries, max_delay_secs)`.
    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        (2000, 3, 60)
    }
}

impl RetryableError for ProviderError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn retry_strategy_params(&self) -> (u64, usize, u64) {
        self.kind.retry_strategy_params()
    }
}
