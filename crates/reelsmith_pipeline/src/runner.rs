//! Stage-ordered generation of one content unit.

use crate::compliance::ComplianceChecker;
use crate::retry::with_key_rotation;
use reelsmith_core::{
    ContentUnit, Pack, Script, Settings, SourceItem, Stage, VoiceSelection, WordTiming,
};
use reelsmith_error::{ProviderError, ProviderErrorKind, ReelsmithError, ReelsmithResult};
use reelsmith_interface::{AssemblyAssets, Collaborators, RenderedSubtitles};
use reelsmith_keys::KeyPool;
use reelsmith_storage::{DuplicateGuard, PackStore};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// A unit completed generation and joined the pack
    Generated {
        /// Id of the new unit
        unit_id: Uuid,
    },
    /// No acceptable candidate was available within the attempt budget
    NoCandidate,
    /// A stage failed; the unit (if one was created) is recorded as failed
    Failed {
        /// Id of the failed unit, absent when fetch never produced one
        unit_id: Option<Uuid>,
        /// Stage that failed
        stage: Stage,
        /// Failure description
        reason: String,
    },
}

/// Drives a single source item through every generation stage.
///
/// All stage failures are converted into a [`PipelineOutcome`] and a unit
/// status transition; the only errors that escape are storage failures,
/// which the daily loop logs and survives.
#[derive(Debug)]
pub struct PipelineRunner {
    settings: Arc<Settings>,
    collaborators: Arc<Collaborators>,
    checker: ComplianceChecker,
}

impl PipelineRunner {
    /// Create a runner over the configured collaborator set.
    pub fn new(settings: Arc<Settings>, collaborators: Arc<Collaborators>) -> Self {
        Self {
            settings,
            collaborators,
            checker: ComplianceChecker::new(),
        }
    }

    /// Generate one content unit into `pack`.
    ///
    /// The pack and the duplicate guard are persisted before returning:
    /// failed units are kept for diagnostics, and a successful unit's source
    /// id is committed to the guard so it can never be picked again.
    #[instrument(skip_all, fields(pack = %pack.date_key))]
    pub async fn run_one(
        &self,
        pool: &mut KeyPool,
        guard: &mut DuplicateGuard,
        store: &PackStore,
        pack: &mut Pack,
    ) -> ReelsmithResult<PipelineOutcome> {
        let item = match self.fetch_candidate(guard).await {
            Ok(Some(item)) => item,
            Ok(None) => {
                info!("No acceptable candidate available");
                return Ok(PipelineOutcome::NoCandidate);
            }
            Err(e) => {
                pack.generation_count += 1;
                pack.generation_failures += 1;
                store.save(pack)?;
                return Ok(PipelineOutcome::Failed {
                    unit_id: None,
                    stage: Stage::SourceFetch,
                    reason: e.to_string(),
                });
            }
        };

        info!(source = %item.id, title = %item.title, "Generating unit from candidate");
        let mut unit = ContentUnit::new(item.id.clone());
        let artifact_dir = store.artifact_dir(&pack.date_key, unit.id)?;

        match self.generate(pool, &artifact_dir, &mut unit, &item).await {
            Ok(()) => {
                unit.mark_generated();
                let unit_id = unit.id;
                pack.units.push(unit);
                pack.generation_count += 1;
                store.save(pack)?;
                // Committed: this source id must never be selected again.
                guard.mark_seen(item.id)?;
                info!(unit = %unit_id, "Unit generated");
                Ok(PipelineOutcome::Generated { unit_id })
            }
            Err((stage, e)) => {
                let reason = e.to_string();
                warn!(unit = %unit.id, %stage, error = %reason, "Generation stage failed");
                unit.mark_failed(stage, reason.clone());
                let unit_id = unit.id;
                pack.units.push(unit);
                pack.generation_count += 1;
                pack.generation_failures += 1;
                store.save(pack)?;
                Ok(PipelineOutcome::Failed {
                    unit_id: Some(unit_id),
                    stage,
                    reason,
                })
            }
        }
    }

    /// Fetch a candidate that passes filters and the duplicate guard, within
    /// the configured attempt budget.
    async fn fetch_candidate(
        &self,
        guard: &DuplicateGuard,
    ) -> ReelsmithResult<Option<SourceItem>> {
        let filters = self.settings.source_filters();
        for attempt in 0..self.settings.generation.candidate_attempts.max(1) {
            let candidate = self
                .bounded(self.collaborators.source.fetch_candidate(
                    &self.settings.source.communities,
                    &filters,
                    guard.ids(),
                ))
                .await?;
            match candidate {
                None => return Ok(None),
                Some(item) if guard.has_seen(&item.id) => {
                    // Source ignored the avoid list; reject and try again.
                    warn!(source = %item.id, attempt, "Candidate already used, fetching another");
                }
                Some(item) => return Ok(Some(item)),
            }
        }
        Ok(None)
    }

    /// Run the stages that mutate the unit, reporting which stage failed.
    async fn generate(
        &self,
        pool: &mut KeyPool,
        artifact_dir: &Path,
        unit: &mut ContentUnit,
        item: &SourceItem,
    ) -> Result<(), (Stage, ReelsmithError)> {
        let script = self.rewrite(pool, item).await.map_err(|e| (Stage::Rewrite, e))?;
        unit.script_text = Some(script.text.clone());

        let (narration, timings) = self
            .narrate(pool, &script, artifact_dir)
            .await
            .map_err(|e| (Stage::Narrate, e))?;
        unit.artifacts.narration = Some(narration.clone());

        let rendered = self
            .bounded(
                self.collaborators
                    .subtitles
                    .render(&script, &timings, artifact_dir),
            )
            .await
            .map_err(|e| (Stage::Subtitles, e))?;
        unit.artifacts.subtitles = Some(rendered.subtitles.clone());
        unit.artifacts.intro_card = Some(rendered.intro_card.clone());

        let video = self
            .assemble(&narration, &rendered, artifact_dir)
            .await
            .map_err(|e| (Stage::Assembly, e))?;
        unit.artifacts.video = Some(video);

        let metadata = self
            .bounded(self.collaborators.metadata.generate(item, &script))
            .await
            .map_err(|e| (Stage::Metadata, e))?;
        unit.metadata = Some(metadata);

        let findings = self.checker.check(&script.text);
        if !findings.is_empty() {
            warn!(unit = %unit.id, findings = ?findings, "Compliance findings");
            unit.compliance_flags = findings.clone();
            if self.settings.compliance.blocking {
                return Err((
                    Stage::Compliance,
                    ProviderError::new(ProviderErrorKind::PolicyReject(findings.join("; ")))
                        .into(),
                ));
            }
        }

        Ok(())
    }

    /// Rewrite the story into a script, with contact details redacted before
    /// it reaches narration.
    async fn rewrite(&self, pool: &mut KeyPool, item: &SourceItem) -> ReelsmithResult<Script> {
        let rotations = self.settings.generation.key_rotations;
        let mut script = with_key_rotation(pool, rotations, |key| async move {
            self.bounded(self.collaborators.rewriter.rewrite(item, key.secret()))
                .await
        })
        .await?;
        script.text = self.checker.redact(&script.text);
        Ok(script)
    }

    /// Synthesize narration audio, returning its path and word timings.
    async fn narrate(
        &self,
        pool: &mut KeyPool,
        script: &Script,
        artifact_dir: &Path,
    ) -> ReelsmithResult<(PathBuf, Vec<WordTiming>)> {
        let voice = VoiceSelection::choose(&self.settings.voice);
        info!(voice = %voice.0, "Selected narration voice");
        let output = artifact_dir.join("narration.mp3");
        let rotations = self.settings.generation.key_rotations;
        let timings = with_key_rotation(pool, rotations, |key| {
            let output = output.clone();
            let voice = voice.clone();
            async move {
                self.bounded(self.collaborators.synthesizer.synthesize(
                    script,
                    &voice,
                    key.secret(),
                    &output,
                ))
                .await
            }
        })
        .await?;
        Ok((output, timings))
    }

    /// Assemble the final video from the generated assets.
    async fn assemble(
        &self,
        narration: &Path,
        rendered: &RenderedSubtitles,
        artifact_dir: &Path,
    ) -> ReelsmithResult<PathBuf> {
        let output = artifact_dir.join("video.mp4");
        let assets = AssemblyAssets {
            narration,
            subtitles: &rendered.subtitles,
            intro_card: &rendered.intro_card,
        };
        self.bounded(self.collaborators.assembler.assemble(assets, &output))
            .await?;
        Ok(output)
    }

    /// Bound an external call to the configured timeout; a timeout is a
    /// transient provider failure, not a fatal one.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = ReelsmithResult<T>>,
    ) -> ReelsmithResult<T> {
        let secs = self.settings.generation.call_timeout_secs;
        match tokio::time::timeout(Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::new(ProviderErrorKind::Timeout(secs)).into()),
        }
    }
}
