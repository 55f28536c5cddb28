//! reelsmith: generation and delivery scheduler for short-form narrated video.
//!
//! The system turns community stories into narrated vertical videos and
//! paces their uploads evenly across a daily horizon. It is organized as a
//! workspace of focused crates, re-exported here:
//!
//! - [`reelsmith_core`] — domain types: packs, content units, settings
//! - [`reelsmith_interface`] — traits for the external collaborators
//!   (story source, rewriter, speech, rendering, upload transport)
//! - [`reelsmith_keys`] — credential pool with rotation and daily reset
//! - [`reelsmith_storage`] — pack persistence and the duplicate guard
//! - [`reelsmith_pipeline`] — the stage-ordered generation pipeline
//! - [`reelsmith_scheduler`] — upload pacing and the daily control loop
//!
//! The bundled binary wires the loop to an offline collaborator set (see
//! [`sandbox`]); real provider integrations implement the
//! [`reelsmith_interface`] traits and plug into the same loop.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod sandbox;

pub use cli::{Cli, Commands};
pub use reelsmith_core::{
    ContentUnit, Pack, PackDateKey, Settings, Stage, UnitStatus, UploadSlot, VideoMetadata,
    VoiceSelection, slot_targets,
};
pub use reelsmith_error::{ReelsmithError, ReelsmithErrorKind, ReelsmithResult};
pub use reelsmith_interface::{Collaborators, UploadReceipt};
pub use reelsmith_keys::KeyPool;
pub use reelsmith_pipeline::{PipelineOutcome, PipelineRunner, TemplateMetadataWriter, TitleFirstRewriter};
pub use reelsmith_scheduler::{DailyLoop, DeliveryScheduler, DispatchReport};
pub use reelsmith_storage::{DuplicateGuard, PackStore};
