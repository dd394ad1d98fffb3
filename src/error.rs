//! Error types for the extraction and correction pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while extracting, aggregating, or correcting
/// health-export data
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("export file not found: {}", .0.display())]
    MissingExport(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed export XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid JSON artifact: {0}")]
    Json(#[from] serde_json::Error),

    #[error("summary artifact not found: {} (run the extraction pass first)", .0.display())]
    MissingArtifact(PathBuf),

    #[error("failed to back up {} to {}: {source}", .original.display(), .backup.display())]
    BackupFailed {
        original: PathBuf,
        backup: PathBuf,
        source: std::io::Error,
    },
}
