//! Crash-safe JSON file helpers shared by the stores.

use reelsmith_error::{JsonError, ReelsmithResult, StorageError, StorageErrorKind};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Serialize `value` and write it to `path` via a sibling temp file and an
/// atomic rename, so readers never observe a partially written file.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> ReelsmithResult<()> {
    let contents = serde_json::to_string_pretty(value)
        .map_err(|e| JsonError::new(format!("Failed to serialize {}: {}", path.display(), e)))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents).map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            tmp.display(),
            e
        )))
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;
    Ok(())
}

/// Read and deserialize a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> ReelsmithResult<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;
    let value = serde_json::from_str(&contents)
        .map_err(|e| JsonError::new(format!("Failed to parse {}: {}", path.display(), e)))?;
    Ok(value)
}
