//! Collaborator trait definitions for the Reelsmith scheduler.
//!
//! The core never performs media generation or network transport itself;
//! every external step is reached through one of the narrow async traits
//! defined here. The pipeline runner and delivery scheduler receive a
//! [`Collaborators`] bundle at startup and call nothing else.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;

pub use traits::{
    AssemblyAssets, Collaborators, MetadataWriter, RenderedSubtitles, ScriptRewriter,
    SpeechSynthesizer, StorySource, SubtitleRenderer, UploadReceipt, UploadTransport,
    VideoAssembler,
};
