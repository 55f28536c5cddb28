//! Core data types for the Reelsmith video scheduler.
//!
//! This crate provides the data model shared across all Reelsmith crates:
//! content units, packs, upload slots, source items, generated metadata,
//! voice selection, and layered configuration.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(missing_docs)]

mod config;
mod metadata;
mod pack;
mod source;
mod unit;
mod voice;

pub use config::{
    ComplianceSettings, DeliverySettings, GenerationSettings, PrivacyStatus, Settings,
    SourceSettings, VoiceSettings,
};
pub use metadata::{MAX_DESCRIPTION_CHARS, MAX_TAGS, MAX_TITLE_CHARS, VideoMetadata};
pub use pack::{Pack, PackDateKey, UploadSlot, slot_targets};
pub use source::{Script, SourceFilters, SourceItem, WordTiming};
pub use unit::{ArtifactPaths, ContentUnit, Stage, UnitStatus, UploadRecord};
pub use voice::VoiceSelection;
