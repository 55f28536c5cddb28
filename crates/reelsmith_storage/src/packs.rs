//! On-disk lifecycle for daily packs.
//!
//! Each pack lives in `<state_dir>/packs/<YYYYMMDD>/`:
//!
//! - `manifest.json` holds the pack-level fields and the unit order
//! - `unit_<uuid>.json` holds one content unit's status, artifact paths,
//!   and metadata
//! - `unit_<uuid>/` holds that unit's generated artifacts
//!
//! The manifest and unit files are rewritten after every mutation; the
//! retention pass deletes whole pack directories oldest-first.

use crate::fs::{read_json, write_json_atomic};
use chrono::{DateTime, Utc};
use reelsmith_core::{ContentUnit, Pack, PackDateKey};
use reelsmith_error::{ReelsmithResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pack-level fields persisted in `manifest.json`.
///
/// Units are stored one file each; the manifest records their order so the
/// delivery timetable survives a restart unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PackManifest {
    date_key: PackDateKey,
    created_at: DateTime<Utc>,
    generation_count: u32,
    generation_failures: u32,
    unit_order: Vec<Uuid>,
}

/// Manages pack directories under the state directory.
#[derive(Debug, Clone)]
pub struct PackStore {
    packs_dir: PathBuf,
}

impl PackStore {
    /// Directory name for packs within the state directory.
    pub const DIR_NAME: &'static str = "packs";

    /// Open the store rooted at `state_dir`, creating the packs directory
    /// if needed.
    pub fn new(state_dir: impl AsRef<Path>) -> ReelsmithResult<Self> {
        let packs_dir = state_dir.as_ref().join(Self::DIR_NAME);
        if !packs_dir.exists() {
            std::fs::create_dir_all(&packs_dir).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    packs_dir.display(),
                    e
                )))
            })?;
        }
        debug!(path = %packs_dir.display(), "Opened pack store");
        Ok(Self { packs_dir })
    }

    /// Directory for a pack.
    pub fn pack_dir(&self, key: &PackDateKey) -> PathBuf {
        self.packs_dir.join(key.as_str())
    }

    /// Artifact directory for one unit within a pack, created on demand.
    pub fn artifact_dir(&self, key: &PackDateKey, unit_id: Uuid) -> ReelsmithResult<PathBuf> {
        let dir = self.pack_dir(key).join(format!("unit_{}", unit_id));
        std::fs::create_dir_all(&dir).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                dir.display(),
                e
            )))
        })?;
        Ok(dir)
    }

    /// Load the pack for a date, or `None` if no directory exists.
    pub fn load(&self, key: &PackDateKey) -> ReelsmithResult<Option<Pack>> {
        let manifest_path = self.pack_dir(key).join("manifest.json");
        if !manifest_path.exists() {
            return Ok(None);
        }

        let manifest: PackManifest = read_json(&manifest_path)?;
        let mut units = Vec::with_capacity(manifest.unit_order.len());
        for unit_id in &manifest.unit_order {
            let unit_path = self.unit_path(key, *unit_id);
            if !unit_path.exists() {
                return Err(StorageError::new(StorageErrorKind::NotFound(format!(
                    "unit {} listed in manifest for pack {}",
                    unit_id, key
                )))
                .into());
            }
            units.push(read_json::<ContentUnit>(&unit_path)?);
        }

        debug!(pack = %key, units = units.len(), "Loaded pack");
        Ok(Some(Pack {
            date_key: manifest.date_key,
            created_at: manifest.created_at,
            units,
            generation_count: manifest.generation_count,
            generation_failures: manifest.generation_failures,
        }))
    }

    /// Load the pack for a date, creating and persisting an empty one if it
    /// does not exist yet.
    pub fn get_or_create(&self, key: &PackDateKey) -> ReelsmithResult<Pack> {
        if let Some(pack) = self.load(key)? {
            return Ok(pack);
        }
        let pack = Pack::new(key.clone());
        self.save(&pack)?;
        info!(pack = %key, "Created new pack");
        Ok(pack)
    }

    /// Load or create the pack for the current UTC day.
    pub fn get_or_create_today(&self) -> ReelsmithResult<Pack> {
        self.get_or_create(&PackDateKey::today())
    }

    /// Persist a pack: manifest plus every unit file.
    pub fn save(&self, pack: &Pack) -> ReelsmithResult<()> {
        let dir = self.pack_dir(&pack.date_key);
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
        }

        for unit in &pack.units {
            write_json_atomic(&self.unit_path(&pack.date_key, unit.id), unit)?;
        }

        let manifest = PackManifest {
            date_key: pack.date_key.clone(),
            created_at: pack.created_at,
            generation_count: pack.generation_count,
            generation_failures: pack.generation_failures,
            unit_order: pack.units.iter().map(|u| u.id).collect(),
        };
        write_json_atomic(&dir.join("manifest.json"), &manifest)?;
        debug!(pack = %pack.date_key, units = pack.units.len(), "Saved pack");
        Ok(())
    }

    /// Persist a single unit file without touching the manifest.
    ///
    /// Used right after an upload succeeds, so the `Uploaded` status and
    /// remote id are durable before the slot is considered complete.
    pub fn save_unit(&self, key: &PackDateKey, unit: &ContentUnit) -> ReelsmithResult<()> {
        write_json_atomic(&self.unit_path(key, unit.id), unit)
    }

    /// Keys of all packs on disk, newest first.
    ///
    /// Directories whose names are not valid date keys are skipped with a
    /// warning rather than failing the scan.
    pub fn list_keys(&self) -> ReelsmithResult<Vec<PackDateKey>> {
        let entries = std::fs::read_dir(&self.packs_dir).map_err(|e| {
            StorageError::new(StorageErrorKind::FileRead(format!(
                "{}: {}",
                self.packs_dir.display(),
                e
            )))
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                StorageError::new(StorageErrorKind::FileRead(format!(
                    "{}: {}",
                    self.packs_dir.display(),
                    e
                )))
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match PackDateKey::parse(&name) {
                Ok(key) => keys.push(key),
                Err(_) => {
                    warn!(name = %name, "Skipping pack directory with invalid name");
                }
            }
        }
        keys.sort();
        keys.reverse();
        Ok(keys)
    }

    /// Delete the oldest packs so at most `max_packs` remain.
    ///
    /// Packs named in `in_flight` had an upload running this cycle; their
    /// deletion is deferred to a later pass rather than pulling artifacts
    /// out from under the transport. A pack whose delivery horizon has not
    /// elapsed is also kept while deliverable units remain, so a short
    /// retention window cannot truncate a day still being delivered.
    /// Returns the keys actually deleted.
    pub fn enforce_retention(
        &self,
        max_packs: usize,
        horizon_hours: u32,
        in_flight: &HashSet<PackDateKey>,
    ) -> ReelsmithResult<Vec<PackDateKey>> {
        let keys = self.list_keys()?;
        if keys.len() <= max_packs {
            return Ok(Vec::new());
        }

        let horizon = chrono::Duration::hours(i64::from(horizon_hours));
        let mut deleted = Vec::new();
        for key in &keys[max_packs..] {
            if in_flight.contains(key) {
                warn!(pack = %key, "Upload in flight, deferring pack deletion");
                continue;
            }
            if let Some(pack) = self.load(key)? {
                let delivering = pack.units.iter().any(|u| u.status.is_deliverable());
                if delivering && Utc::now() < pack.created_at + horizon {
                    warn!(pack = %key, "Delivery horizon not elapsed, deferring pack deletion");
                    continue;
                }
            }
            let dir = self.pack_dir(key);
            std::fs::remove_dir_all(&dir).map_err(|e| {
                StorageError::new(StorageErrorKind::Deletion(format!(
                    "{}: {}",
                    dir.display(),
                    e
                )))
            })?;
            info!(pack = %key, "Deleted pack past retention window");
            deleted.push(key.clone());
        }
        Ok(deleted)
    }

    fn unit_path(&self, key: &PackDateKey, unit_id: Uuid) -> PathBuf {
        self.pack_dir(key).join(format!("unit_{}.json", unit_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::env;

    fn key(year: i32, month: u32, day: u32) -> PackDateKey {
        PackDateKey::from_date(NaiveDate::from_ymd_opt(year, month, day).unwrap())
    }

    fn sample_unit() -> ContentUnit {
        let mut unit = ContentUnit::new("t3_abc".to_string());
        unit.script_text = Some("script text".to_string());
        unit
    }

    #[test]
    fn test_save_and_reload_pack() {
        let temp_dir = env::temp_dir().join("reelsmith_packs_roundtrip_test");
        std::fs::remove_dir_all(&temp_dir).ok();

        let store = PackStore::new(&temp_dir).unwrap();
        let mut pack = store.get_or_create(&key(2026, 8, 29)).unwrap();
        let mut unit = sample_unit();
        unit.mark_generated();
        pack.units.push(unit.clone());
        pack.generation_count = 1;
        store.save(&pack).unwrap();

        let reloaded = store.load(&key(2026, 8, 29)).unwrap().unwrap();
        assert_eq!(reloaded.units.len(), 1);
        assert_eq!(reloaded.units[0].id, unit.id);
        assert_eq!(reloaded.generation_count, 1);

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_save_unit_survives_reload() {
        let temp_dir = env::temp_dir().join("reelsmith_packs_unit_test");
        std::fs::remove_dir_all(&temp_dir).ok();

        let store = PackStore::new(&temp_dir).unwrap();
        let mut pack = store.get_or_create(&key(2026, 8, 29)).unwrap();
        let mut unit = sample_unit();
        unit.mark_generated();
        pack.units.push(unit.clone());
        store.save(&pack).unwrap();

        assert!(unit.mark_uploaded(
            "vid123".to_string(),
            Some("https://example.com/vid123".to_string())
        ));
        store.save_unit(&pack.date_key, &unit).unwrap();

        let reloaded = store.load(&key(2026, 8, 29)).unwrap().unwrap();
        let record = reloaded.units[0].upload.as_ref().unwrap();
        assert_eq!(record.remote_id, "vid123");

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_retention_keeps_newest() {
        let temp_dir = env::temp_dir().join("reelsmith_packs_retention_test");
        std::fs::remove_dir_all(&temp_dir).ok();

        let store = PackStore::new(&temp_dir).unwrap();
        for day in 1..=5 {
            store.get_or_create(&key(2026, 8, day)).unwrap();
        }

        let deleted = store.enforce_retention(3, 24, &HashSet::new()).unwrap();
        assert_eq!(deleted, vec![key(2026, 8, 2), key(2026, 8, 1)]);

        let remaining = store.list_keys().unwrap();
        assert_eq!(
            remaining,
            vec![key(2026, 8, 5), key(2026, 8, 4), key(2026, 8, 3)]
        );

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_retention_defers_in_flight_packs() {
        let temp_dir = env::temp_dir().join("reelsmith_packs_inflight_test");
        std::fs::remove_dir_all(&temp_dir).ok();

        let store = PackStore::new(&temp_dir).unwrap();
        for day in 1..=5 {
            store.get_or_create(&key(2026, 8, day)).unwrap();
        }

        // Both evictable packs had failed uploads this cycle; both survive.
        let busy = HashSet::from([key(2026, 8, 1), key(2026, 8, 2)]);
        let deleted = store.enforce_retention(3, 24, &busy).unwrap();
        assert!(deleted.is_empty());
        assert!(store.load(&key(2026, 8, 1)).unwrap().is_some());
        assert!(store.load(&key(2026, 8, 2)).unwrap().is_some());

        // Next pass with no upload running deletes them.
        let deleted = store.enforce_retention(3, 24, &HashSet::new()).unwrap();
        assert_eq!(deleted, vec![key(2026, 8, 2), key(2026, 8, 1)]);
        assert!(store.load(&key(2026, 8, 1)).unwrap().is_none());

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_retention_waits_out_delivery_horizon() {
        let temp_dir = env::temp_dir().join("reelsmith_packs_horizon_test");
        std::fs::remove_dir_all(&temp_dir).ok();

        let store = PackStore::new(&temp_dir).unwrap();
        for day in 2..=4 {
            store.get_or_create(&key(2026, 8, day)).unwrap();
        }
        let mut pack = Pack::new(key(2026, 8, 1));
        let mut unit = sample_unit();
        unit.mark_generated();
        pack.units.push(unit);
        store.save(&pack).unwrap();

        // Oldest pack still has a deliverable unit inside its 24h horizon.
        let deleted = store.enforce_retention(3, 24, &HashSet::new()).unwrap();
        assert!(deleted.is_empty());
        assert!(store.load(&key(2026, 8, 1)).unwrap().is_some());

        // Once the horizon has elapsed the pack is fair game.
        pack.created_at = Utc::now() - chrono::Duration::hours(25);
        store.save(&pack).unwrap();
        let deleted = store.enforce_retention(3, 24, &HashSet::new()).unwrap();
        assert_eq!(deleted, vec![key(2026, 8, 1)]);

        std::fs::remove_dir_all(&temp_dir).ok();
    }

    #[test]
    fn test_invalid_directory_names_are_skipped() {
        let temp_dir = env::temp_dir().join("reelsmith_packs_invalid_test");
        std::fs::remove_dir_all(&temp_dir).ok();

        let store = PackStore::new(&temp_dir).unwrap();
        store.get_or_create(&key(2026, 8, 29)).unwrap();
        std::fs::create_dir_all(temp_dir.join(PackStore::DIR_NAME).join("notadate")).unwrap();

        let keys = store.list_keys().unwrap();
        assert_eq!(keys, vec![key(2026, 8, 29)]);

        std::fs::remove_dir_all(&temp_dir).ok();
    }
}
