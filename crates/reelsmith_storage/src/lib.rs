//! Persistence layer for the Reelsmith scheduler.
//!
//! Two durable stores live under the configured state directory:
//!
//! - [`DuplicateGuard`] keeps the append-only set of source-item ids that
//!   have already been committed to a generated video, so the story source
//!   never reuses them.
//! - [`PackStore`] manages one directory per daily pack, with a manifest
//!   and one JSON file per content unit, and enforces the retention policy.
//!
//! All writes go through a temp-file-and-rename so a crash mid-write never
//! leaves a truncated JSON file behind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod fs;
mod packs;
mod seen;

pub use packs::PackStore;
pub use seen::DuplicateGuard;
