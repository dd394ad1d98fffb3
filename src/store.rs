//! Summary artifact persistence
//!
//! Writes and reloads the per-metric JSON artifacts under a data directory
//! with fixed file names. The artifacts are the pipeline's only output and
//! are treated as immutable snapshots by everything downstream except the
//! correction engine.

use std::fs;
use std::path::Path;

use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ExtractError;
use crate::types::SleepNight;

/// Corrected sleep artifact, written by the correction engine
pub const SLEEP_CORRECTED_ARTIFACT: &str = "sleep_data_corrected.json";
/// Pre-correction safety copy of the sleep artifact
pub const SLEEP_BACKUP_ARTIFACT: &str = "sleep_data_backup.json";

/// Create `dir` (and parents) if absent
pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        info!("created directory {}", dir.display());
    }
    Ok(())
}

/// Serialize `rows` as pretty-printed JSON at `path`, creating the parent
/// directory if needed
pub fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExtractError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reload a previously persisted artifact. A missing file is a fatal
/// precondition error; a malformed row fails the whole load.
pub fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::MissingArtifact(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Reload the persisted sleep artifact
pub fn read_sleep_rows(path: &Path) -> Result<Vec<SleepNight>, ExtractError> {
    read_rows(path)
}

/// Copy `original` to `backup` byte-for-byte, unless a backup already exists.
/// An existing backup is never overwritten. Returns whether a copy was made.
pub fn backup_once(original: &Path, backup: &Path) -> Result<bool, ExtractError> {
    if backup.exists() {
        info!("backup {} already exists, skipping", backup.display());
        return Ok(false);
    }
    fs::copy(original, backup).map_err(|source| ExtractError::BackupFailed {
        original: original.to_path_buf(),
        backup: backup.to_path_buf(),
        source,
    })?;
    info!("created backup at {}", backup.display());
    Ok(true)
}
