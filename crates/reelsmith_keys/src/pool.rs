//! Round-robin key pool with exhaustion tracking.

use chrono::{DateTime, NaiveDate, Utc};
use derive_getters::Getters;
use reelsmith_error::{KeyPoolError, KeyPoolErrorKind, ProviderErrorKind, ReelsmithResult};
use tracing::{debug, info, warn};

/// One credential key and its health state.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Key {
    /// Stable identifier within the pool
    id: String,
    /// The credential secret handed to provider calls
    secret: String,
    /// Skipped by selection until the next reset
    exhausted: bool,
    /// Timestamp of the most recent reported failure
    last_failure_at: Option<DateTime<Utc>>,
}

/// Ordered pool of credential keys for one provider.
///
/// Selection is round-robin among keys not marked exhausted. Keys are only
/// deprioritized, never removed, so an exhausted key becomes eligible again
/// after [`KeyPool::daily_reset`].
///
/// # Examples
///
/// ```
/// use reelsmith_keys::KeyPool;
///
/// let mut pool = KeyPool::new("gemini", vec!["s1".to_string(), "s2".to_string()]).unwrap();
/// let first = pool.acquire().unwrap().id().clone();
/// let second = pool.acquire().unwrap().id().clone();
/// assert_ne!(first, second);
/// ```
#[derive(Debug, Clone)]
pub struct KeyPool {
    provider: String,
    keys: Vec<Key>,
    cursor: usize,
    reset_date: NaiveDate,
}

impl KeyPool {
    /// Build a pool from ordered secrets.
    ///
    /// # Errors
    ///
    /// Returns an error when `secrets` is empty; running without any key is a
    /// startup configuration problem, not something to discover mid-cycle.
    pub fn new(provider: impl Into<String>, secrets: Vec<String>) -> ReelsmithResult<Self> {
        let provider = provider.into();
        if secrets.is_empty() {
            Err(KeyPoolError::new(KeyPoolErrorKind::EmptyPool(
                provider.clone(),
            )))?;
        }
        let keys = secrets
            .into_iter()
            .enumerate()
            .map(|(i, secret)| Key {
                id: format!("{}-{}", provider, i + 1),
                secret,
                exhausted: false,
                last_failure_at: None,
            })
            .collect();
        Ok(Self {
            provider,
            keys,
            cursor: 0,
            reset_date: Utc::now().date_naive(),
        })
    }

    /// Provider this pool serves.
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Number of keys in the pool.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the pool holds no keys. Never true after construction.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether every key is currently marked exhausted.
    pub fn all_exhausted(&self) -> bool {
        self.keys.iter().all(|k| k.exhausted)
    }

    /// Supply the next usable key, round-robin.
    ///
    /// # Errors
    ///
    /// Fails with `NoKeysAvailable` when every key is exhausted. Fatal for
    /// the current pipeline step, not for the process; the caller decides
    /// whether to abort the unit or the day.
    pub fn acquire(&mut self) -> ReelsmithResult<Key> {
        for offset in 0..self.keys.len() {
            let idx = (self.cursor + offset) % self.keys.len();
            if !self.keys[idx].exhausted {
                self.cursor = (idx + 1) % self.keys.len();
                debug!(provider = %self.provider, key = %self.keys[idx].id, "Acquired key");
                return Ok(self.keys[idx].clone());
            }
        }
        warn!(provider = %self.provider, "All keys exhausted");
        Err(KeyPoolError::new(KeyPoolErrorKind::NoKeysAvailable(
            self.provider.clone(),
        )))?
    }

    /// Report a classified failure for a key.
    ///
    /// Quota and authentication failures mark the key exhausted; transient
    /// failures only record the timestamp, leaving the key selectable.
    pub fn report_failure(
        &mut self,
        key_id: &str,
        kind: &ProviderErrorKind,
    ) -> ReelsmithResult<()> {
        let key = self.key_mut(key_id)?;
        key.last_failure_at = Some(Utc::now());
        if kind.exhausts_key() {
            key.exhausted = true;
            info!(key = %key_id, %kind, "Key marked exhausted");
        } else {
            debug!(key = %key_id, %kind, "Transient failure recorded, key stays usable");
        }
        Ok(())
    }

    /// Report a successful call for a key, clearing its failure state.
    pub fn report_success(&mut self, key_id: &str) -> ReelsmithResult<()> {
        let key = self.key_mut(key_id)?;
        key.exhausted = false;
        key.last_failure_at = None;
        Ok(())
    }

    /// Clear exhaustion for every key when the date rolls over.
    ///
    /// Provider quotas reset daily; the day's first cycle calls this so keys
    /// that went cold yesterday get retried.
    pub fn reset_if_new_day(&mut self) {
        let today = Utc::now().date_naive();
        if today > self.reset_date {
            self.daily_reset();
            self.reset_date = today;
        }
    }

    /// Unconditionally clear exhaustion for every key.
    pub fn daily_reset(&mut self) {
        let revived = self.keys.iter().filter(|k| k.exhausted).count();
        for key in &mut self.keys {
            key.exhausted = false;
        }
        if revived > 0 {
            info!(provider = %self.provider, revived, "Daily key reset");
        }
    }

    fn key_mut(&mut self, key_id: &str) -> ReelsmithResult<&mut Key> {
        self.keys
            .iter_mut()
            .find(|k| k.id == key_id)
            .ok_or_else(|| {
                KeyPoolError::new(KeyPoolErrorKind::UnknownKey(key_id.to_string())).into()
            })
    }
}
