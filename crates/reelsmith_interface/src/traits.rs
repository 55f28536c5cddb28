//! Trait definitions for external pipeline collaborators.

use async_trait::async_trait;
use reelsmith_core::{
    PrivacyStatus, Script, SourceFilters, SourceItem, VideoMetadata, VoiceSelection, WordTiming,
};
use reelsmith_error::ReelsmithResult;
use std::path::{Path, PathBuf};

/// Fetches candidate stories from the source platform.
///
/// Implementations apply the provided filters and skip any id in
/// `avoid_ids`; returning `None` means no acceptable candidate is available
/// right now (not an error).
#[async_trait]
pub trait StorySource: Send + Sync {
    /// Fetch one candidate story, or `None` when nothing qualifies.
    async fn fetch_candidate(
        &self,
        communities: &[String],
        filters: &SourceFilters,
        avoid_ids: &[String],
    ) -> ReelsmithResult<Option<SourceItem>>;
}

/// Rewrites a raw story into a narration script.
#[async_trait]
pub trait ScriptRewriter: Send + Sync {
    /// Produce the narration script for a source item.
    ///
    /// The credential key for the active generation provider is threaded in
    /// by the pipeline; implementations that need no key ignore it.
    async fn rewrite(&self, item: &SourceItem, key: &str) -> ReelsmithResult<Script>;
}

/// Synthesizes narration audio from a script.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize narration to `output`, returning per-word timings.
    ///
    /// Timings may be empty when the provider does not report them.
    async fn synthesize(
        &self,
        script: &Script,
        voice: &VoiceSelection,
        key: &str,
        output: &Path,
    ) -> ReelsmithResult<Vec<WordTiming>>;
}

/// Subtitle and intro-card artifacts produced by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSubtitles {
    /// Subtitle timing JSON
    pub subtitles: PathBuf,
    /// Intro card image
    pub intro_card: PathBuf,
}

/// Renders subtitle timing and the intro card image.
#[async_trait]
pub trait SubtitleRenderer: Send + Sync {
    /// Render subtitles and the intro card into `output_dir`.
    async fn render(
        &self,
        script: &Script,
        timings: &[WordTiming],
        output_dir: &Path,
    ) -> ReelsmithResult<RenderedSubtitles>;
}

/// Inputs for final video assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyAssets<'a> {
    /// Narration audio file
    pub narration: &'a Path,
    /// Subtitle timing JSON
    pub subtitles: &'a Path,
    /// Intro card image
    pub intro_card: &'a Path,
}

/// Assembles the final video from generated assets.
///
/// Long-running; the runner awaits it sequentially and treats a failure as a
/// render error for the unit.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    /// Assemble the final video into `output`.
    async fn assemble(&self, assets: AssemblyAssets<'_>, output: &Path) -> ReelsmithResult<()>;
}

/// Generates upload metadata from the script and source item.
#[async_trait]
pub trait MetadataWriter: Send + Sync {
    /// Produce title, description, tags, and hashtags.
    async fn generate(&self, item: &SourceItem, script: &Script) -> ReelsmithResult<VideoMetadata>;
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    /// Opaque remote video identifier
    pub remote_id: String,
    /// Public URL, when the transport provides one
    pub url: Option<String>,
}

/// Uploads a finished video to the remote platform.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Upload `video` with its metadata, returning the remote identity.
    ///
    /// Implementations handle resumable-chunk retries internally; a returned
    /// error means the whole attempt failed and the slot retries next cycle.
    async fn upload(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        privacy: PrivacyStatus,
    ) -> ReelsmithResult<UploadReceipt>;
}

/// The full collaborator set injected into the pipeline runner and delivery
/// scheduler at startup.
pub struct Collaborators {
    /// Story source
    pub source: Box<dyn StorySource>,
    /// Script rewriter
    pub rewriter: Box<dyn ScriptRewriter>,
    /// Speech synthesizer
    pub synthesizer: Box<dyn SpeechSynthesizer>,
    /// Subtitle/intro-card renderer
    pub subtitles: Box<dyn SubtitleRenderer>,
    /// Video assembler
    pub assembler: Box<dyn VideoAssembler>,
    /// Metadata generator
    pub metadata: Box<dyn MetadataWriter>,
    /// Upload transport
    pub transport: Box<dyn UploadTransport>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
