//! Backoff retry and credential rotation for keyed provider calls.

use reelsmith_error::{
    KeyPoolError, KeyPoolErrorKind, ProviderErrorKind, ReelsmithError, ReelsmithErrorKind,
    ReelsmithResult,
};
use reelsmith_keys::{Key, KeyPool};
use std::future::Future;
use tracing::{info, warn};

/// Pull the provider classification out of an error, if it has one.
fn provider_kind(err: &ReelsmithError) -> Option<&ProviderErrorKind> {
    match err.kind() {
        ReelsmithErrorKind::Provider(e) => Some(&e.kind),
        _ => None,
    }
}

/// Run a keyed provider call, retrying transient failures on the same key
/// and rotating to the next key when the current one reports quota or auth
/// exhaustion.
///
/// At most `max_rotations` keys are tried (minimum one). Non-provider errors
/// and permanent provider errors (policy rejections, render failures) return
/// immediately without consuming the key.
pub async fn with_key_rotation<T, F, Fut>(
    pool: &mut KeyPool,
    max_rotations: u32,
    mut op: F,
) -> ReelsmithResult<T>
where
    F: FnMut(Key) -> Fut,
    Fut: Future<Output = ReelsmithResult<T>>,
{
    let mut last_err: Option<ReelsmithError> = None;
    for rotation in 0..max_rotations.max(1) {
        let key = match pool.acquire() {
            Ok(key) => key,
            Err(e) => return Err(last_err.unwrap_or(e)),
        };

        match call_with_backoff(&key, &mut op).await {
            Ok(value) => {
                pool.report_success(key.id())?;
                return Ok(value);
            }
            Err(e) => {
                let kind = provider_kind(&e).cloned();
                match kind {
                    Some(kind) if kind.exhausts_key() => {
                        pool.report_failure(key.id(), &kind)?;
                        warn!(
                            key = %key.id(),
                            rotation,
                            error = %e,
                            "Key exhausted, rotating to next key"
                        );
                        last_err = Some(e);
                    }
                    _ => return Err(e),
                }
            }
        }
    }

    Err(last_err.unwrap_or_else(|| {
        KeyPoolError::new(KeyPoolErrorKind::NoKeysAvailable("all rotations used".to_string()))
            .into()
    }))
}

/// One key's worth of attempts: try once, and when the failure is transient
/// retry with exponential backoff and jitter using the error's own strategy
/// parameters.
async fn call_with_backoff<T, F, Fut>(key: &Key, op: &mut F) -> ReelsmithResult<T>
where
    F: FnMut(Key) -> Fut,
    Fut: Future<Output = ReelsmithResult<T>>,
{
    use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};

    let first = op(key.clone()).await;
    let (initial_ms, max_retries, max_delay_secs) = match &first {
        Ok(_) => return first,
        Err(e) => match provider_kind(e) {
            Some(kind) if kind.is_retryable() => kind.retry_strategy_params(),
            _ => return first,
        },
    };

    info!(
        key = %key.id(),
        initial_backoff_ms = initial_ms,
        max_retries,
        max_delay_secs,
        "Transient provider failure, retrying with backoff"
    );

    let strategy = ExponentialBackoff::from_millis(initial_ms)
        .factor(2)
        .max_delay(std::time::Duration::from_secs(max_delay_secs))
        .map(jitter)
        .take(max_retries);

    Retry::spawn(strategy, || {
        let fut = op(key.clone());
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(e) => {
                    let retryable = provider_kind(&e).is_some_and(|k| k.is_retryable());
                    if retryable {
                        warn!(error = %e, "Provider call failed, will retry");
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    } else {
                        Err(RetryError::Permanent(e))
                    }
                }
            }
        }
    })
    .await
}
