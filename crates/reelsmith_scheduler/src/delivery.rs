//! Upload slot computation and dispatch.

use chrono::{Duration, Utc};
use reelsmith_core::{
    Pack, PackDateKey, PrivacyStatus, Settings, UploadSlot, VideoMetadata, slot_targets,
};
use reelsmith_error::{
    ReelsmithError, ReelsmithErrorKind, ReelsmithResult, TransportError, TransportErrorKind,
};
use reelsmith_interface::{Collaborators, UploadReceipt};
use reelsmith_storage::PackStore;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// What a dispatch pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Slots that were due and attempted
    pub dispatched: u32,
    /// Uploads that completed
    pub uploaded: u32,
    /// Attempts that failed and will retry next cycle
    pub failed: u32,
    /// Units excluded after exceeding the attempt cap or a permanent reject
    pub abandoned: u32,
    /// Packs with a failed upload that resumes next cycle; retention defers
    /// deleting them
    pub retrying_packs: HashSet<PackDateKey>,
}

/// Recomputes each pack's upload timetable and dispatches due slots.
///
/// The timetable spreads a pack's generated units evenly across the delivery
/// horizon from the pack's creation time. Target times are fixed: a slot
/// whose upload failed keeps its already-elapsed target, so it is due again
/// immediately on the next cycle.
#[derive(Debug)]
pub struct DeliveryScheduler {
    settings: Arc<Settings>,
    collaborators: Arc<Collaborators>,
    // Attempt counts reset on restart; the cap bounds runaway retries within
    // a run, not across process lifetimes.
    attempts: HashMap<Uuid, u32>,
}

impl DeliveryScheduler {
    /// Create a scheduler over the configured transport.
    pub fn new(settings: Arc<Settings>, collaborators: Arc<Collaborators>) -> Self {
        Self {
            settings,
            collaborators,
            attempts: HashMap::new(),
        }
    }

    /// Compute the current timetable for a pack.
    ///
    /// One slot per generated unit, in pack order, evenly spaced across the
    /// horizon from the pack's creation time.
    pub fn slots_for(&self, pack: &Pack) -> Vec<UploadSlot> {
        let horizon = Duration::hours(i64::from(self.settings.delivery.horizon_hours));
        let units: Vec<_> = pack.generated_units().collect();
        let targets = slot_targets(pack.created_at, units.len(), horizon);
        units
            .iter()
            .zip(targets)
            .map(|(unit, target_time)| UploadSlot {
                pack_date_key: pack.date_key.clone(),
                content_unit_id: unit.id,
                target_time,
                attempt_count: self.attempts.get(&unit.id).copied().unwrap_or(0),
                last_error: match &unit.status {
                    reelsmith_core::UnitStatus::UploadFailed { reason } => Some(reason.clone()),
                    _ => None,
                },
            })
            .collect()
    }

    /// Dispatch every due slot across all retained packs.
    ///
    /// Per-slot failures are absorbed into unit status transitions; only
    /// storage errors escape. Honors `shutdown` between slots, finishing the
    /// upload in progress first.
    #[instrument(skip_all)]
    pub async fn dispatch_due(
        &mut self,
        store: &PackStore,
        shutdown: &watch::Receiver<bool>,
    ) -> ReelsmithResult<DispatchReport> {
        let mut report = DispatchReport::default();
        let now = Utc::now();
        let mut live_units: HashSet<Uuid> = HashSet::new();

        for key in store.list_keys()? {
            let Some(mut pack) = store.load(&key)? else {
                continue;
            };
            live_units.extend(pack.units.iter().map(|u| u.id));
            if pack.delivery_complete() {
                continue;
            }
            let due: Vec<UploadSlot> = self
                .slots_for(&pack)
                .into_iter()
                .filter(|slot| slot.target_time <= now)
                .collect();

            for slot in due {
                if *shutdown.borrow() {
                    info!("Shutdown requested, stopping dispatch");
                    return Ok(report);
                }
                self.dispatch_slot(store, &mut pack, &slot, &mut report)
                    .await?;
            }
        }
        // Attempt counts for units in evicted packs would otherwise linger
        // for the process lifetime.
        self.attempts.retain(|id, _| live_units.contains(id));
        Ok(report)
    }

    /// Upload one due unit and persist the resulting status immediately.
    async fn dispatch_slot(
        &mut self,
        store: &PackStore,
        pack: &mut Pack,
        slot: &UploadSlot,
        report: &mut DispatchReport,
    ) -> ReelsmithResult<()> {
        let privacy = self.settings.delivery.privacy;
        let cap = self.settings.delivery.max_upload_attempts;
        let key = pack.date_key.clone();
        let Some(unit) = pack.unit_mut(slot.content_unit_id) else {
            return Ok(());
        };
        if !unit.status.is_deliverable() {
            return Ok(());
        }

        let (Some(video), Some(metadata)) = (unit.artifacts.video.clone(), unit.metadata.clone())
        else {
            warn!(unit = %unit.id, "Unit missing video or metadata, abandoning");
            unit.mark_abandoned("missing video or metadata artifact");
            store.save_unit(&key, unit)?;
            report.abandoned += 1;
            return Ok(());
        };

        report.dispatched += 1;
        let metadata = metadata.clamped_for_upload();
        info!(
            unit = %unit.id,
            pack = %key,
            target = %slot.target_time,
            attempt = slot.attempt_count + 1,
            "Dispatching upload"
        );

        match self.bounded_upload(&video, &metadata, privacy).await {
            Ok(receipt) => {
                if unit.mark_uploaded(receipt.remote_id.clone(), receipt.url) {
                    // Durable before the slot is considered complete.
                    store.save_unit(&key, unit)?;
                    self.attempts.remove(&slot.content_unit_id);
                    report.uploaded += 1;
                    info!(unit = %unit.id, remote_id = %receipt.remote_id, "Upload complete");
                }
            }
            Err(e) => {
                let attempts = {
                    let n = self.attempts.entry(slot.content_unit_id).or_insert(0);
                    *n += 1;
                    *n
                };
                let permanent = matches!(
                    e.kind(),
                    ReelsmithErrorKind::Transport(t) if !t.kind.is_retryable()
                );
                if permanent {
                    warn!(unit = %unit.id, error = %e, "Upload rejected permanently");
                    unit.mark_abandoned(e.to_string());
                    self.attempts.remove(&slot.content_unit_id);
                    report.abandoned += 1;
                } else if cap > 0 && attempts >= cap {
                    warn!(
                        unit = %unit.id,
                        attempts,
                        "Upload attempt cap reached, abandoning unit"
                    );
                    unit.mark_abandoned(format!("attempt cap {} reached: {}", cap, e));
                    self.attempts.remove(&slot.content_unit_id);
                    report.abandoned += 1;
                } else {
                    warn!(unit = %unit.id, error = %e, "Upload failed, will retry next cycle");
                    unit.mark_upload_failed(e.to_string());
                    report.failed += 1;
                    report.retrying_packs.insert(key.clone());
                }
                store.save_unit(&key, unit)?;
            }
        }
        Ok(())
    }

    /// Upload with the configured bounded wait; elapse is a transient
    /// transport failure, so the slot retries at its elapsed target.
    async fn bounded_upload(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        privacy: PrivacyStatus,
    ) -> ReelsmithResult<UploadReceipt> {
        let secs = self.settings.generation.call_timeout_secs;
        let fut = self.collaborators.transport.upload(video, metadata, privacy);
        match tokio::time::timeout(std::time::Duration::from_secs(secs), fut).await {
            Ok(result) => result,
            Err(_) => Err(ReelsmithError::from(TransportError::new(
                TransportErrorKind::Transient(format!("upload timed out after {}s", secs)),
            ))),
        }
    }
}
