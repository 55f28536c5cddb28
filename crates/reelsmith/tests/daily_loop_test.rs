use async_trait::async_trait;
use reelsmith::sandbox::{
    SandboxAssembler, SandboxSource, SandboxSubtitleRenderer, SandboxSynthesizer,
};
use reelsmith::{Collaborators, DailyLoop, DuplicateGuard, PackStore, UnitStatus, UploadReceipt};
use reelsmith_core::{
    ComplianceSettings, DeliverySettings, GenerationSettings, PrivacyStatus, Settings,
    SourceFilters, SourceItem, SourceSettings, Stage, VideoMetadata, VoiceSettings,
};
use reelsmith_error::{ReelsmithResult, TransportError, TransportErrorKind};
use reelsmith_interface::{StorySource, UploadTransport};
use reelsmith_pipeline::{TemplateMetadataWriter, TitleFirstRewriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::watch;

/// Settings tuned for fast, deterministic test cycles.
fn test_settings(state_dir: PathBuf, pack_size: usize, max_upload_attempts: u32) -> Settings {
    Settings {
        state_dir,
        keys: vec!["key-a".to_string(), "key-b".to_string()],
        source: SourceSettings {
            communities: vec!["stories".to_string()],
            min_score: 100,
            min_words: 400,
            max_words: 600,
            max_chars: 50_000,
        },
        generation: GenerationSettings {
            target_pack_size: pack_size,
            daily_budget: 8,
            max_consecutive_failures: 3,
            candidate_attempts: 3,
            key_rotations: 3,
            call_timeout_secs: 10,
        },
        delivery: DeliverySettings {
            horizon_hours: 24,
            cycle_minutes: 5,
            max_upload_attempts,
            privacy: PrivacyStatus::Private,
            max_packs: 3,
        },
        voice: VoiceSettings {
            forced: Some("en-US-AriaNeural".to_string()),
            voices: vec!["en-US-AriaNeural".to_string()],
            randomize: false,
        },
        compliance: ComplianceSettings { blocking: false },
    }
}

/// Transport that fails a configured number of times before succeeding,
/// counting every call.
struct FlakyTransport {
    calls: Arc<AtomicU32>,
    fail_first: u32,
}

#[async_trait]
impl UploadTransport for FlakyTransport {
    async fn upload(
        &self,
        _video: &Path,
        _metadata: &VideoMetadata,
        _privacy: PrivacyStatus,
    ) -> ReelsmithResult<UploadReceipt> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.fail_first {
            return Err(
                TransportError::new(TransportErrorKind::Transient(format!("outage {}", n))).into(),
            );
        }
        Ok(UploadReceipt {
            remote_id: format!("vid-{}", n),
            url: None,
        })
    }
}

/// Transport that hangs well past any configured call timeout.
struct StalledTransport {
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl UploadTransport for StalledTransport {
    async fn upload(
        &self,
        _video: &Path,
        _metadata: &VideoMetadata,
        _privacy: PrivacyStatus,
    ) -> ReelsmithResult<UploadReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        Ok(UploadReceipt {
            remote_id: "never".to_string(),
            url: None,
        })
    }
}

/// Source that always returns a story with policy-sensitive phrasing.
struct FlaggedSource;

#[async_trait]
impl StorySource for FlaggedSource {
    async fn fetch_candidate(
        &self,
        _communities: &[String],
        _filters: &SourceFilters,
        _avoid_ids: &[String],
    ) -> ReelsmithResult<Option<SourceItem>> {
        Ok(Some(SourceItem {
            id: "flagged-1".to_string(),
            title: "A long week".to_string(),
            body: "He told the whole office he was going to kill the mood with his speech, \
                   and everyone braced for the worst friday meeting of the year."
                .to_string(),
            author: "throwaway".to_string(),
            score: 500,
            community: "stories".to_string(),
            url: "https://example.com/flagged-1".to_string(),
        }))
    }
}

fn collaborators_with_transport(transport: Box<dyn UploadTransport>) -> Collaborators {
    Collaborators {
        source: Box::new(SandboxSource::default()),
        rewriter: Box::new(TitleFirstRewriter::new()),
        synthesizer: Box::new(SandboxSynthesizer),
        subtitles: Box::new(SandboxSubtitleRenderer),
        assembler: Box::new(SandboxAssembler),
        metadata: Box::new(TemplateMetadataWriter::new()),
        transport,
    }
}

fn temp_state_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    std::fs::remove_dir_all(&dir).ok();
    dir
}

async fn run_cycle(daily: &mut DailyLoop) {
    daily.cycle().await.expect("cycle should not fail");
}

#[tokio::test]
async fn test_cycle_fills_pack_and_uploads_first_slot() {
    let state_dir = temp_state_dir("reelsmith_it_first_slot");
    let settings = Arc::new(test_settings(state_dir.clone(), 2, 0));
    let calls = Arc::new(AtomicU32::new(0));
    let collaborators = Arc::new(collaborators_with_transport(Box::new(FlakyTransport {
        calls: calls.clone(),
        fail_first: 0,
    })));
    let (_tx, rx) = watch::channel(false);

    let mut daily = DailyLoop::new(settings.clone(), collaborators, rx).unwrap();
    run_cycle(&mut daily).await;

    let store = PackStore::new(&settings.state_dir).unwrap();
    let pack = store.get_or_create_today().unwrap();
    assert_eq!(pack.units.len(), 2);

    // First slot is due at the pack origin; the second waits twelve hours.
    let statuses: Vec<_> = pack.units.iter().map(|u| &u.status).collect();
    assert_eq!(statuses[0], &UnitStatus::Uploaded);
    assert_eq!(statuses[1], &UnitStatus::Generated);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Both source ids are committed to the duplicate guard.
    let guard = DuplicateGuard::load(&settings.state_dir).unwrap();
    assert_eq!(guard.len(), 2);
    for unit in &pack.units {
        assert!(guard.has_seen(&unit.source_item_id));
    }

    std::fs::remove_dir_all(&state_dir).ok();
}

#[tokio::test]
async fn test_failed_upload_retries_next_cycle_and_uploads_once() {
    let state_dir = temp_state_dir("reelsmith_it_retry");
    let settings = Arc::new(test_settings(state_dir.clone(), 1, 0));
    let calls = Arc::new(AtomicU32::new(0));
    let collaborators = Arc::new(collaborators_with_transport(Box::new(FlakyTransport {
        calls: calls.clone(),
        fail_first: 2,
    })));
    let (_tx, rx) = watch::channel(false);

    let mut daily = DailyLoop::new(settings.clone(), collaborators, rx).unwrap();
    let store = PackStore::new(&settings.state_dir).unwrap();

    // Two failing cycles: the slot keeps its elapsed target and retries.
    run_cycle(&mut daily).await;
    let pack = store.get_or_create_today().unwrap();
    assert!(matches!(pack.units[0].status, UnitStatus::UploadFailed { .. }));

    run_cycle(&mut daily).await;
    run_cycle(&mut daily).await;

    let pack = store.get_or_create_today().unwrap();
    assert_eq!(pack.units.len(), 1);
    assert_eq!(pack.units[0].status, UnitStatus::Uploaded);
    let record = pack.units[0].upload.as_ref().unwrap();
    assert_eq!(record.remote_id, "vid-3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    // Further cycles never touch the uploaded unit.
    run_cycle(&mut daily).await;
    let pack = store.get_or_create_today().unwrap();
    assert_eq!(pack.units[0].upload.as_ref().unwrap().remote_id, "vid-3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    std::fs::remove_dir_all(&state_dir).ok();
}

#[tokio::test]
async fn test_attempt_cap_abandons_unit() {
    let state_dir = temp_state_dir("reelsmith_it_cap");
    let settings = Arc::new(test_settings(state_dir.clone(), 1, 2));
    let calls = Arc::new(AtomicU32::new(0));
    let collaborators = Arc::new(collaborators_with_transport(Box::new(FlakyTransport {
        calls: calls.clone(),
        fail_first: u32::MAX,
    })));
    let (_tx, rx) = watch::channel(false);

    let mut daily = DailyLoop::new(settings.clone(), collaborators, rx).unwrap();
    run_cycle(&mut daily).await;
    run_cycle(&mut daily).await;

    let store = PackStore::new(&settings.state_dir).unwrap();
    let pack = store.get_or_create_today().unwrap();
    assert!(matches!(pack.units[0].status, UnitStatus::Abandoned { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // Abandoned units get no further attempts, and their attempt count is
    // dropped rather than carried for the process lifetime.
    run_cycle(&mut daily).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let slots = daily.scheduler().slots_for(&pack);
    assert_eq!(slots[0].attempt_count, 0);

    std::fs::remove_dir_all(&state_dir).ok();
}

#[tokio::test]
async fn test_restart_resumes_without_duplicating_work() {
    let state_dir = temp_state_dir("reelsmith_it_restart");
    let settings = Arc::new(test_settings(state_dir.clone(), 1, 0));
    let calls = Arc::new(AtomicU32::new(0));
    let (_tx, rx) = watch::channel(false);

    {
        let collaborators = Arc::new(collaborators_with_transport(Box::new(FlakyTransport {
            calls: calls.clone(),
            fail_first: 0,
        })));
        let mut daily = DailyLoop::new(settings.clone(), collaborators, rx.clone()).unwrap();
        run_cycle(&mut daily).await;
    }

    // Fresh process: same state directory, new loop instance.
    let collaborators = Arc::new(collaborators_with_transport(Box::new(FlakyTransport {
        calls: calls.clone(),
        fail_first: 0,
    })));
    let mut daily = DailyLoop::new(settings.clone(), collaborators, rx).unwrap();
    run_cycle(&mut daily).await;

    let store = PackStore::new(&settings.state_dir).unwrap();
    let pack = store.get_or_create_today().unwrap();
    assert_eq!(pack.units.len(), 1);
    assert_eq!(pack.units[0].status, UnitStatus::Uploaded);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    std::fs::remove_dir_all(&state_dir).ok();
}

#[tokio::test]
async fn test_stalled_upload_times_out_and_retries_next_cycle() {
    let state_dir = temp_state_dir("reelsmith_it_stalled");
    let mut settings = test_settings(state_dir.clone(), 1, 0);
    settings.generation.call_timeout_secs = 1;
    let settings = Arc::new(settings);
    let calls = Arc::new(AtomicU32::new(0));
    let collaborators = Arc::new(collaborators_with_transport(Box::new(StalledTransport {
        calls: calls.clone(),
    })));
    let (_tx, rx) = watch::channel(false);

    let mut daily = DailyLoop::new(settings.clone(), collaborators, rx).unwrap();
    let started = std::time::Instant::now();
    run_cycle(&mut daily).await;

    // The cycle finishes on the timeout, not on the hung transport.
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let store = PackStore::new(&settings.state_dir).unwrap();
    let pack = store.get_or_create_today().unwrap();
    match &pack.units[0].status {
        UnitStatus::UploadFailed { reason } => assert!(reason.contains("timed out")),
        other => panic!("expected upload failure, got {:?}", other),
    }

    // The slot keeps its elapsed target, so the next cycle tries again.
    run_cycle(&mut daily).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    std::fs::remove_dir_all(&state_dir).ok();
}

#[tokio::test]
async fn test_blocking_compliance_fails_flagged_unit() {
    let state_dir = temp_state_dir("reelsmith_it_blocking");
    let mut settings = test_settings(state_dir.clone(), 1, 0);
    settings.source.min_words = 1;
    settings.compliance.blocking = true;
    let settings = Arc::new(settings);
    let mut collaborators = collaborators_with_transport(Box::new(FlakyTransport {
        calls: Arc::new(AtomicU32::new(0)),
        fail_first: 0,
    }));
    collaborators.source = Box::new(FlaggedSource);
    let (_tx, rx) = watch::channel(false);

    let mut daily = DailyLoop::new(settings.clone(), Arc::new(collaborators), rx).unwrap();
    run_cycle(&mut daily).await;

    let store = PackStore::new(&settings.state_dir).unwrap();
    let pack = store.get_or_create_today().unwrap();
    assert!(!pack.units.is_empty());
    for unit in &pack.units {
        assert!(matches!(
            unit.status,
            UnitStatus::Failed {
                stage: Stage::Compliance,
                ..
            }
        ));
    }

    // A flagged source id is never committed to the duplicate guard.
    let guard = DuplicateGuard::load(&settings.state_dir).unwrap();
    assert!(!guard.has_seen("flagged-1"));

    std::fs::remove_dir_all(&state_dir).ok();
}

#[tokio::test]
async fn test_retention_runs_as_part_of_cycle() {
    let state_dir = temp_state_dir("reelsmith_it_retention");
    let settings = Arc::new(test_settings(state_dir.clone(), 1, 0));
    let store = PackStore::new(&settings.state_dir).unwrap();

    // Seed stale packs well past the retention window.
    for raw in ["20240101", "20240102", "20240103"] {
        let key = reelsmith::PackDateKey::parse(raw).unwrap();
        store.get_or_create(&key).unwrap();
    }

    let collaborators = Arc::new(collaborators_with_transport(Box::new(FlakyTransport {
        calls: Arc::new(AtomicU32::new(0)),
        fail_first: 0,
    })));
    let (_tx, rx) = watch::channel(false);
    let mut daily = DailyLoop::new(settings.clone(), collaborators, rx).unwrap();
    run_cycle(&mut daily).await;

    // Today's pack plus the two newest stale ones survive.
    let keys = store.list_keys().unwrap();
    assert_eq!(keys.len(), 3);
    assert!(!keys.contains(&reelsmith::PackDateKey::parse("20240101").unwrap()));

    std::fs::remove_dir_all(&state_dir).ok();
}
