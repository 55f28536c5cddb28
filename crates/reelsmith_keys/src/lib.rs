//! Credential key rotation for external generation providers.
//!
//! A [`KeyPool`] holds an ordered set of credential keys for one provider and
//! supplies the next usable key on demand. Keys are never removed: a
//! quota/auth failure marks a key exhausted and round-robin selection skips
//! it until the next daily reset, when provider-side quotas come back.
//!
//! State is process-local. The scheduler runs as a single instance with one
//! control task, so no cross-process coordination is needed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod pool;

pub use pool::{Key, KeyPool};
