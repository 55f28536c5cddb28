//! Offline collaborator set for local runs and rehearsals.
//!
//! Every trait in [`reelsmith_interface`] gets an implementation that is
//! instant and network-free: stories are synthesized locally, narration and
//! video artifacts are written as placeholder files, and uploads return a
//! fabricated remote id. The full loop — pacing, retention, persistence,
//! duplicate guarding — runs exactly as it would against real providers.

use async_trait::async_trait;
use reelsmith_core::{
    PrivacyStatus, Script, SourceFilters, SourceItem, VideoMetadata, VoiceSelection, WordTiming,
};
use reelsmith_error::{ProviderError, ProviderErrorKind, ReelsmithResult, TransportError, TransportErrorKind};
use reelsmith_interface::{
    AssemblyAssets, Collaborators, MetadataWriter, RenderedSubtitles, ScriptRewriter,
    SpeechSynthesizer, StorySource, SubtitleRenderer, UploadReceipt, UploadTransport,
    VideoAssembler,
};
use reelsmith_pipeline::{TemplateMetadataWriter, TitleFirstRewriter};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use uuid::Uuid;

const STORY_TITLES: &[&str] = &[
    "My roommate labeled every item in the fridge",
    "I accidentally joined the wrong wedding party",
    "The neighbor's parrot learned my alarm tone",
    "A stranger returned my wallet with interest",
    "My dad replied to a scam email for three months",
];

/// Emits an endless stream of synthetic stories with unique ids.
#[derive(Debug, Default)]
pub struct SandboxSource {
    counter: AtomicU64,
}

#[async_trait]
impl StorySource for SandboxSource {
    async fn fetch_candidate(
        &self,
        communities: &[String],
        filters: &SourceFilters,
        avoid_ids: &[String],
    ) -> ReelsmithResult<Option<SourceItem>> {
        loop {
            let n = self.counter.fetch_add(1, Ordering::SeqCst);
            let id = format!("sandbox-{}", n);
            if avoid_ids.contains(&id) {
                continue;
            }
            let title = STORY_TITLES[(n as usize) % STORY_TITLES.len()];
            let community = communities
                .first()
                .cloned()
                .unwrap_or_else(|| "stories".to_string());
            // Body sized to clear the word-count filters.
            let sentence = "Then things took a turn nobody in the room expected at all. ";
            let body = sentence.repeat(filters.min_words / 11 + 1);
            let item = SourceItem {
                id,
                title: title.to_string(),
                body,
                author: "sandbox_author".to_string(),
                score: filters.min_score + 1,
                community,
                url: format!("https://example.invalid/story/{}", n),
            };
            debug!(source = %item.id, "Sandbox story produced");
            return Ok(Some(item));
        }
    }
}

/// Writes a placeholder narration file and fabricates word timings at the
/// standard narration pace.
#[derive(Debug, Default)]
pub struct SandboxSynthesizer;

#[async_trait]
impl SpeechSynthesizer for SandboxSynthesizer {
    async fn synthesize(
        &self,
        script: &Script,
        voice: &VoiceSelection,
        _key: &str,
        output: &Path,
    ) -> ReelsmithResult<Vec<WordTiming>> {
        std::fs::write(output, format!("sandbox narration ({})", voice.0)).map_err(|e| {
            ProviderError::new(ProviderErrorKind::Transient(format!(
                "writing {}: {}",
                output.display(),
                e
            )))
        })?;

        let step = 1.0 / 2.5;
        let timings = script
            .text
            .split_whitespace()
            .enumerate()
            .map(|(i, word)| WordTiming {
                word: word.to_string(),
                start_secs: i as f64 * step,
                end_secs: (i + 1) as f64 * step,
            })
            .collect();
        Ok(timings)
    }
}

/// Writes subtitle timing JSON and a placeholder intro card.
#[derive(Debug, Default)]
pub struct SandboxSubtitleRenderer;

#[async_trait]
impl SubtitleRenderer for SandboxSubtitleRenderer {
    async fn render(
        &self,
        _script: &Script,
        timings: &[WordTiming],
        output_dir: &Path,
    ) -> ReelsmithResult<RenderedSubtitles> {
        let subtitles = output_dir.join("subtitles.json");
        let contents = serde_json::to_string_pretty(timings).map_err(|e| {
            ProviderError::new(ProviderErrorKind::Render(format!(
                "serializing timings: {}",
                e
            )))
        })?;
        std::fs::write(&subtitles, contents).map_err(|e| render_error(&subtitles, e))?;

        let intro_card = output_dir.join("intro_card.png");
        std::fs::write(&intro_card, b"sandbox intro card")
            .map_err(|e| render_error(&intro_card, e))?;

        Ok(RenderedSubtitles {
            subtitles,
            intro_card,
        })
    }
}

/// Writes a placeholder video file instead of rendering.
#[derive(Debug, Default)]
pub struct SandboxAssembler;

#[async_trait]
impl VideoAssembler for SandboxAssembler {
    async fn assemble(&self, assets: AssemblyAssets<'_>, output: &Path) -> ReelsmithResult<()> {
        debug!(
            narration = %assets.narration.display(),
            subtitles = %assets.subtitles.display(),
            "Sandbox assembly"
        );
        std::fs::write(output, b"sandbox video").map_err(|e| render_error(output, e))?;
        Ok(())
    }
}

/// Accepts every upload and fabricates a remote id.
#[derive(Debug, Default)]
pub struct SandboxTransport;

#[async_trait]
impl UploadTransport for SandboxTransport {
    async fn upload(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        privacy: PrivacyStatus,
    ) -> ReelsmithResult<UploadReceipt> {
        if !video.exists() {
            return Err(TransportError::new(TransportErrorKind::FileNotFound(
                video.display().to_string(),
            ))
            .into());
        }
        let remote_id = format!("sbx-{}", Uuid::new_v4().simple());
        debug!(title = %metadata.title, %privacy, remote_id = %remote_id, "Sandbox upload");
        Ok(UploadReceipt {
            url: Some(format!("https://example.invalid/watch/{}", remote_id)),
            remote_id,
        })
    }
}

fn render_error(path: &Path, e: std::io::Error) -> ProviderError {
    ProviderError::new(ProviderErrorKind::Render(format!(
        "writing {}: {}",
        path.display(),
        e
    )))
}

/// The full offline collaborator set.
pub fn sandbox_collaborators() -> Collaborators {
    Collaborators {
        source: Box::new(SandboxSource::default()),
        rewriter: Box::new(TitleFirstRewriter::new()),
        synthesizer: Box::new(SandboxSynthesizer),
        subtitles: Box::new(SandboxSubtitleRenderer),
        assembler: Box::new(SandboxAssembler),
        metadata: Box::new(TemplateMetadataWriter::new()),
        transport: Box::new(SandboxTransport),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_source_respects_avoid_list() {
        let source = SandboxSource::default();
        let filters = SourceFilters {
            min_score: 100,
            min_words: 400,
            max_words: 600,
            max_chars: 50_000,
        };
        let first = source
            .fetch_candidate(&["stories".to_string()], &filters, &[])
            .await
            .unwrap()
            .unwrap();
        let second = source
            .fetch_candidate(&["stories".to_string()], &filters, &[first.id.clone()])
            .await
            .unwrap()
            .unwrap();
        assert_ne!(first.id, second.id);
        assert!(filters.accepts(&first));
    }

    #[tokio::test]
    async fn test_synthesizer_paces_timings() {
        let dir = std::env::temp_dir().join("reelsmith_sandbox_tts_test");
        std::fs::create_dir_all(&dir).unwrap();
        let script = Script {
            text: "one two three four five".to_string(),
            estimated_duration_secs: 2,
            original_title: "t".to_string(),
            original_author: "a".to_string(),
        };
        let timings = SandboxSynthesizer
            .synthesize(
                &script,
                &VoiceSelection("en-US-AriaNeural".to_string()),
                "",
                &dir.join("narration.mp3"),
            )
            .await
            .unwrap();
        assert_eq!(timings.len(), 5);
        assert!((timings[4].end_secs - 2.0).abs() < 0.01);
        std::fs::remove_dir_all(&dir).ok();
    }
}
