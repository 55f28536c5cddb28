//! Durable record of source items that have already been turned into videos.

use crate::fs::{read_json, write_json_atomic};
use reelsmith_error::{ReelsmithResult, StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of the seen-id store.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SeenRecord {
    /// Source-item ids in the order they were committed
    ids: Vec<String>,
}

/// Append-only set of source-item ids that were committed to a generated
/// content unit.
///
/// The set grows monotonically and is never pruned: a pruned id would let
/// the same story resurface months later. Every mutation is persisted
/// immediately, so a crash between generating a unit and the next cycle
/// cannot reopen a consumed id.
#[derive(Debug, Clone)]
pub struct DuplicateGuard {
    path: PathBuf,
    ids: Vec<String>,
    index: HashSet<String>,
}

impl DuplicateGuard {
    /// File name of the store within the state directory.
    pub const FILE_NAME: &'static str = "seen_ids.json";

    /// Load the guard from `state_dir`, starting empty if no store exists yet.
    pub fn load(state_dir: impl AsRef<Path>) -> ReelsmithResult<Self> {
        let state_dir = state_dir.as_ref();
        if !state_dir.exists() {
            std::fs::create_dir_all(state_dir).map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    state_dir.display(),
                    e
                )))
            })?;
        }

        let path = state_dir.join(Self::FILE_NAME);
        let record: SeenRecord = if path.exists() {
            read_json(&path)?
        } else {
            debug!(path = %path.display(), "No existing seen-id store, starting empty");
            SeenRecord::default()
        };

        let index = record.ids.iter().cloned().collect();
        debug!(count = record.ids.len(), "Loaded seen-id store");
        Ok(Self {
            path,
            ids: record.ids,
            index,
        })
    }

    /// Whether a source item has already been used.
    pub fn has_seen(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record a source item as used and persist the store immediately.
    ///
    /// Idempotent: marking an id twice writes nothing new.
    pub fn mark_seen(&mut self, id: impl Into<String>) -> ReelsmithResult<()> {
        let id = id.into();
        if !self.index.insert(id.clone()) {
            return Ok(());
        }
        debug!(id = %id, "Marking source item as seen");
        self.ids.push(id);
        self.persist()
    }

    /// Number of recorded ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no ids have been recorded.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in commit order, for passing to the story source as an avoid list.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    fn persist(&self) -> ReelsmithResult<()> {
        let record = SeenRecord {
            ids: self.ids.clone(),
        };
        write_json_atomic(&self.path, &record)
    }
}
