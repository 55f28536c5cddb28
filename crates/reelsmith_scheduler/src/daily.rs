//! The daily generation-and-delivery control loop.

use crate::delivery::{DeliveryScheduler, DispatchReport};
use reelsmith_core::{Pack, Settings};
use reelsmith_error::ReelsmithResult;
use reelsmith_interface::Collaborators;
use reelsmith_keys::KeyPool;
use reelsmith_pipeline::{PipelineOutcome, PipelineRunner};
use reelsmith_storage::{DuplicateGuard, PackStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

/// Single-writer control loop: one cycle tops up today's pack, dispatches
/// due uploads, and enforces retention, then sleeps until the next cycle.
///
/// Nothing a cycle does can crash the loop: per-unit and per-slot failures
/// become status transitions, and anything else is logged and retried next
/// cycle. Shutdown is cooperative; the unit or upload in progress finishes
/// first.
#[derive(Debug)]
pub struct DailyLoop {
    settings: Arc<Settings>,
    runner: PipelineRunner,
    scheduler: DeliveryScheduler,
    pool: KeyPool,
    guard: DuplicateGuard,
    store: PackStore,
    shutdown: watch::Receiver<bool>,
}

impl DailyLoop {
    /// Wire up the loop from settings and the collaborator set.
    ///
    /// Fails only on configuration or storage errors; this is the one place
    /// an error is allowed to stop startup.
    pub fn new(
        settings: Arc<Settings>,
        collaborators: Arc<Collaborators>,
        shutdown: watch::Receiver<bool>,
    ) -> ReelsmithResult<Self> {
        settings.validate()?;
        let pool = KeyPool::new("gemini", settings.keys.clone())?;
        let guard = DuplicateGuard::load(&settings.state_dir)?;
        let store = PackStore::new(&settings.state_dir)?;
        let runner = PipelineRunner::new(settings.clone(), collaborators.clone());
        let scheduler = DeliveryScheduler::new(settings.clone(), collaborators);
        Ok(Self {
            settings,
            runner,
            scheduler,
            pool,
            guard,
            store,
            shutdown,
        })
    }

    /// Run cycles until shutdown is signalled.
    pub async fn run(mut self) -> ReelsmithResult<()> {
        let cycle = Duration::from_secs(self.settings.delivery.cycle_minutes * 60);
        info!(
            cycle_minutes = self.settings.delivery.cycle_minutes,
            "Starting daily loop"
        );
        loop {
            if *self.shutdown.borrow() {
                break;
            }
            if let Err(e) = self.cycle().await {
                error!(error = %e, "Cycle failed, continuing on next cycle");
            }
            let mut shutdown = self.shutdown.clone();
            tokio::select! {
                _ = tokio::time::sleep(cycle) => {}
                _ = shutdown.changed() => {}
            }
        }
        info!("Daily loop stopped");
        Ok(())
    }

    /// One full pass: key reset, generation top-up, dispatch, retention.
    #[instrument(skip_all)]
    pub async fn cycle(&mut self) -> ReelsmithResult<DispatchReport> {
        self.pool.reset_if_new_day();

        let mut pack = self.store.get_or_create_today()?;
        self.top_up(&mut pack).await?;

        let report = self.scheduler.dispatch_due(&self.store, &self.shutdown).await?;
        if report != DispatchReport::default() {
            info!(
                uploaded = report.uploaded,
                failed = report.failed,
                abandoned = report.abandoned,
                "Dispatch pass complete"
            );
        }

        self.store.enforce_retention(
            self.settings.delivery.max_packs,
            self.settings.delivery.horizon_hours,
            &report.retrying_packs,
        )?;
        Ok(report)
    }

    /// Generate units until the pack is full, the daily attempt budget is
    /// spent, failures pile up, or every key is exhausted.
    async fn top_up(&mut self, pack: &mut Pack) -> ReelsmithResult<()> {
        let target = self.settings.generation.target_pack_size;
        let budget = self.settings.generation.daily_budget;
        let failure_cap = self.settings.generation.max_consecutive_failures;
        let mut consecutive_failures = 0u32;

        loop {
            if *self.shutdown.borrow() {
                info!("Shutdown requested, stopping generation");
                return Ok(());
            }
            if pack.generated_units().count() >= target {
                return Ok(());
            }
            if pack.generation_count >= budget {
                info!(budget, "Daily generation budget spent");
                return Ok(());
            }
            if consecutive_failures >= failure_cap {
                warn!(
                    consecutive_failures,
                    "Too many consecutive failures, pausing generation until next cycle"
                );
                return Ok(());
            }
            if self.pool.all_exhausted() {
                warn!("All keys exhausted, pausing generation until daily reset");
                return Ok(());
            }

            match self
                .runner
                .run_one(&mut self.pool, &mut self.guard, &self.store, pack)
                .await?
            {
                PipelineOutcome::Generated { unit_id } => {
                    info!(
                        unit = %unit_id,
                        generated = pack.generated_units().count(),
                        target,
                        "Pack progress"
                    );
                    consecutive_failures = 0;
                }
                PipelineOutcome::NoCandidate => {
                    info!("No candidates available, pausing generation until next cycle");
                    return Ok(());
                }
                PipelineOutcome::Failed { stage, reason, .. } => {
                    warn!(%stage, reason = %reason, "Generation attempt failed");
                    consecutive_failures += 1;
                }
            }
        }
    }

    /// The duplicate guard, for status reporting.
    pub fn guard(&self) -> &DuplicateGuard {
        &self.guard
    }

    /// The pack store, for status reporting.
    pub fn store(&self) -> &PackStore {
        &self.store
    }

    /// The delivery scheduler, for timetable inspection.
    pub fn scheduler(&self) -> &DeliveryScheduler {
        &self.scheduler
    }
}
