//! The content generation pipeline.
//!
//! [`PipelineRunner`] drives one source item through the full stage sequence
//! (fetch, duplicate check, rewrite, narration, subtitles, assembly,
//! metadata, compliance) and converts every stage failure into a unit status
//! transition instead of letting it escape. Keyed provider calls go through
//! [`with_key_rotation`], which retries transient failures with backoff and
//! rotates to the next credential on quota or auth errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod compliance;
mod metadata;
mod retry;
mod rewrite;
mod runner;

pub use compliance::ComplianceChecker;
pub use metadata::TemplateMetadataWriter;
pub use retry::with_key_rotation;
pub use rewrite::TitleFirstRewriter;
pub use runner::{PipelineOutcome, PipelineRunner};
