//! Persistence service: background flush of the presets collection.
//!
//! DESIGN
//! ======
//! Writes only touch memory and set a dirty flag. A background task checks
//! the flag every interval and, when set, writes the whole collection to a
//! snapshot file (temp file + rename, so a crash never leaves half a file).
//!
//! ERROR HANDLING
//! ==============
//! The dirty flag is restored when a write fails, so the next tick retries.
//! A snapshot that exists but does not parse stops startup instead of being
//! silently replaced.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::remote::{MemoryRemote, PresetDocument};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed for {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("snapshot {path} is malformed: {source}")]
    Malformed { path: PathBuf, source: serde_json::Error },
    #[error("snapshot serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn io_error(path: &Path, source: std::io::Error) -> SnapshotError {
    SnapshotError::Io { path: path.to_path_buf(), source }
}

/// Read stored documents. A missing file is an empty collection.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub async fn load_snapshot(path: &Path) -> Result<Vec<PresetDocument>, SnapshotError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_str(&text).map_err(|source| SnapshotError::Malformed { path: path.to_path_buf(), source })
}

/// Write every document to `path`, replacing the previous snapshot.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem step fails.
pub async fn write_snapshot(path: &Path, documents: &[PresetDocument]) -> Result<(), SnapshotError> {
    let json = serde_json::to_vec_pretty(documents)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error(parent, e))?;
    }
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, json)
        .await
        .map_err(|e| io_error(&tmp, e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Flush the collection if it changed. Returns whether a snapshot was written.
///
/// # Errors
///
/// Returns the write error after re-marking the collection dirty.
pub async fn flush_if_dirty(documents: &MemoryRemote, path: &Path) -> Result<bool, SnapshotError> {
    let Some(snapshot) = documents.take_dirty_snapshot().await else {
        return Ok(false);
    };
    if let Err(e) = write_snapshot(path, &snapshot).await {
        documents.mark_dirty().await;
        return Err(e);
    }
    Ok(true)
}

/// Spawn the background persistence task. Returns a handle for shutdown.
pub fn spawn_persistence_task(documents: MemoryRemote, path: PathBuf, flush_interval_ms: u64) -> JoinHandle<()> {
    info!(flush_interval_ms, path = %path.display(), "presets persistence flush configured");
    tokio::spawn(async move {
        loop {
            match flush_if_dirty(&documents, &path).await {
                Ok(true) => info!(path = %path.display(), "presets snapshot written"),
                Ok(false) => {}
                Err(e) => error!(error = %e, "presets snapshot flush failed"),
            }
            tokio::time::sleep(Duration::from_millis(flush_interval_ms)).await;
        }
    })
}

#[cfg(test)]
#[path = "persistence_test.rs"]
mod tests;
