//! Content unit model and status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Pipeline stage identifiers, in execution order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Fetching a candidate story from the source collaborator
    SourceFetch,
    /// Rejecting already-seen candidates
    DuplicateCheck,
    /// Rewriting the raw story into a narration script
    Rewrite,
    /// Synthesizing narration audio
    Narrate,
    /// Generating subtitle and intro-card artifacts
    Subtitles,
    /// Assembling the final video
    Assembly,
    /// Generating title/description/tags
    Metadata,
    /// Advisory compliance scan
    Compliance,
}

/// Lifecycle status of a content unit.
///
/// `Uploaded` is terminal: no later cycle may change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(tag = "state", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UnitStatus {
    /// Created, generation not yet complete
    Pending,
    /// All generation stages succeeded; eligible for delivery
    Generated,
    /// Generation failed at a stage; retained for diagnostics, never delivered
    Failed {
        /// Stage at which generation failed
        stage: Stage,
        /// Failure description
        reason: String,
    },
    /// Upload completed; terminal
    Uploaded,
    /// Last upload attempt failed; retried on the next cycle
    UploadFailed {
        /// Failure description
        reason: String,
    },
    /// Upload retry cap exceeded; excluded from further delivery
    Abandoned {
        /// Final failure description
        reason: String,
    },
}

impl UnitStatus {
    /// Whether this unit should be offered an upload slot.
    pub fn is_deliverable(&self) -> bool {
        matches!(
            self,
            UnitStatus::Generated | UnitStatus::UploadFailed { .. }
        )
    }

    /// Whether this status is terminal for delivery purposes.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnitStatus::Uploaded | UnitStatus::Failed { .. } | UnitStatus::Abandoned { .. }
        )
    }
}

/// Filesystem locations of the artifacts generated for one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Narration audio file
    pub narration: Option<PathBuf>,
    /// Subtitle timing JSON
    pub subtitles: Option<PathBuf>,
    /// Intro card image
    pub intro_card: Option<PathBuf>,
    /// Assembled video file
    pub video: Option<PathBuf>,
}

/// Remote identity recorded after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Opaque remote video identifier returned by the transport
    pub remote_id: String,
    /// Public URL, when the transport provides one
    pub url: Option<String>,
    /// Completion timestamp
    pub uploaded_at: DateTime<Utc>,
}

/// One video-with-metadata work item.
///
/// Created by the pipeline runner; mutated only by the runner during
/// generation and by the delivery scheduler during upload. Immutable once
/// `Uploaded`.
///
/// # Examples
///
/// ```
/// use reelsmith_core::{ContentUnit, UnitStatus};
///
/// let unit = ContentUnit::new("abc123".to_string());
/// assert_eq!(unit.status, UnitStatus::Pending);
/// assert_eq!(unit.source_item_id, "abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Unique unit identifier
    pub id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Identifier of the source item this unit was built from
    pub source_item_id: String,
    /// Narration script text
    pub script_text: Option<String>,
    /// Generated artifact locations
    pub artifacts: ArtifactPaths,
    /// Generated upload metadata
    pub metadata: Option<crate::VideoMetadata>,
    /// Advisory compliance findings
    pub compliance_flags: Vec<String>,
    /// Lifecycle status
    pub status: UnitStatus,
    /// Remote identity after a successful upload
    pub upload: Option<UploadRecord>,
}

impl ContentUnit {
    /// Create a new pending unit for a source item.
    pub fn new(source_item_id: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source_item_id,
            script_text: None,
            artifacts: ArtifactPaths::default(),
            metadata: None,
            compliance_flags: Vec::new(),
            status: UnitStatus::Pending,
            upload: None,
        }
    }

    /// Mark generation complete. No effect on terminal statuses.
    pub fn mark_generated(&mut self) {
        if !self.status.is_terminal() {
            self.status = UnitStatus::Generated;
        }
    }

    /// Mark generation failed at a stage. No effect once uploaded.
    pub fn mark_failed(&mut self, stage: Stage, reason: impl Into<String>) {
        if self.status != UnitStatus::Uploaded {
            self.status = UnitStatus::Failed {
                stage,
                reason: reason.into(),
            };
        }
    }

    /// Record a successful upload.
    ///
    /// Returns false without mutating when the unit is already uploaded, so a
    /// replayed dispatch after a restart can never overwrite the remote id.
    pub fn mark_uploaded(&mut self, remote_id: String, url: Option<String>) -> bool {
        if self.status == UnitStatus::Uploaded {
            return false;
        }
        self.upload = Some(UploadRecord {
            remote_id,
            url,
            uploaded_at: Utc::now(),
        });
        self.status = UnitStatus::Uploaded;
        true
    }

    /// Record a failed upload attempt. No effect once uploaded.
    pub fn mark_upload_failed(&mut self, reason: impl Into<String>) {
        if self.status != UnitStatus::Uploaded {
            self.status = UnitStatus::UploadFailed {
                reason: reason.into(),
            };
        }
    }

    /// Exclude the unit from further delivery after exceeding the retry cap.
    pub fn mark_abandoned(&mut self, reason: impl Into<String>) {
        if self.status != UnitStatus::Uploaded {
            self.status = UnitStatus::Abandoned {
                reason: reason.into(),
            };
        }
    }
}
