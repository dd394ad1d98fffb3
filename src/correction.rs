//! Sleep data correction
//!
//! From a fixed cutoff date onward the source export double-counts in-bed
//! time inside the asleep figure. This engine reloads the persisted sleep
//! artifact, rewrites `asleep` to `max(0, asleep - in_bed)` for every night
//! on or after the cutoff, and persists the corrected copy alongside the
//! original. Before anything is written a one-time backup of the original is
//! taken; replacing the original in place is gated on an injected decision so
//! the core logic stays free of blocking I/O.
//!
//! The correction is not self-idempotent: applied twice to the same rows it
//! subtracts `in_bed` twice. The engine always reads the uncorrected original
//! and writes to a distinct artifact name, so double-application only arises
//! after a confirmed in-place replacement followed by a re-run.

use std::path::PathBuf;

use chrono::NaiveDate;
use log::info;

use crate::error::ExtractError;
use crate::store::{self, SLEEP_BACKUP_ARTIFACT, SLEEP_CORRECTED_ARTIFACT};
use crate::types::{MetricKind, SleepNight};

/// First night affected by the asleep/in-bed double counting
pub fn correction_cutoff() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 20).expect("hardcoded cutoff date is valid")
}

/// Outcome statistics of a correction pass. Reporting only; never affects
/// the persisted data.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionReport {
    /// Rows loaded from the artifact
    pub rows_processed: usize,
    /// Rows dated on or after the cutoff
    pub rows_in_window: usize,
    /// Rows whose asleep value actually changed
    pub rows_changed: usize,
    /// Summed reduction in asleep hours across changed rows
    pub total_reduction_h: f64,
}

impl CorrectionReport {
    /// Mean reduction in asleep hours across changed rows
    pub fn average_reduction_h(&self) -> Option<f64> {
        if self.rows_changed == 0 {
            None
        } else {
            Some(self.total_reduction_h / self.rows_changed as f64)
        }
    }
}

/// Apply the correction rule to an independent copy of `rows`. Rows before
/// `cutoff` pass through unchanged; the input is never mutated.
pub fn correct_rows(rows: &[SleepNight], cutoff: NaiveDate) -> Vec<SleepNight> {
    rows.iter()
        .map(|row| {
            let mut corrected = row.clone();
            if row.date >= cutoff {
                corrected.asleep = (row.asleep - row.in_bed).max(0.0);
            }
            corrected
        })
        .collect()
}

/// Compare original and corrected rows and compute the report statistics
pub fn analyze(original: &[SleepNight], corrected: &[SleepNight], cutoff: NaiveDate) -> CorrectionReport {
    let rows_in_window = original.iter().filter(|r| r.date >= cutoff).count();

    let mut rows_changed = 0usize;
    let mut total_reduction_h = 0.0;
    for (before, after) in original.iter().zip(corrected) {
        if before.asleep != after.asleep {
            rows_changed += 1;
            total_reduction_h += before.asleep - after.asleep;
        }
    }

    CorrectionReport {
        rows_processed: original.len(),
        rows_in_window,
        rows_changed,
        total_reduction_h,
    }
}

/// Three-phase correction engine: load, correct, persist
pub struct CorrectionEngine {
    data_dir: PathBuf,
}

impl CorrectionEngine {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn original_path(&self) -> PathBuf {
        self.data_dir.join(MetricKind::SleepAnalysis.artifact_name())
    }

    pub fn corrected_path(&self) -> PathBuf {
        self.data_dir.join(SLEEP_CORRECTED_ARTIFACT)
    }

    pub fn backup_path(&self) -> PathBuf {
        self.data_dir.join(SLEEP_BACKUP_ARTIFACT)
    }

    /// Run the full pass. `confirm_replace` decides, given the report,
    /// whether the original artifact is replaced in place after the corrected
    /// copy has been persisted; `false` leaves the original untouched.
    ///
    /// The backup is taken before any write. If it fails, no corrected
    /// output is produced.
    pub fn run<F>(&self, confirm_replace: F) -> Result<CorrectionReport, ExtractError>
    where
        F: FnOnce(&CorrectionReport) -> bool,
    {
        let original_path = self.original_path();

        // Phase 1: load
        let original = store::read_sleep_rows(&original_path)?;
        info!("loaded {} sleep rows from {}", original.len(), original_path.display());

        // Phase 2: correct, on a full independent copy
        let cutoff = correction_cutoff();
        let corrected = correct_rows(&original, cutoff);
        let report = analyze(&original, &corrected, cutoff);

        // Phase 3: persist, backup first
        store::backup_once(&original_path, &self.backup_path())?;
        store::write_rows(&self.corrected_path(), &corrected)?;
        info!(
            "corrected {} of {} rows (dates >= {})",
            report.rows_in_window, report.rows_processed, cutoff
        );

        if confirm_replace(&report) {
            store::write_rows(&original_path, &corrected)?;
            info!("replaced {} with corrected data", original_path.display());
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;
    use std::fs;

    fn night(date: (i32, u32, u32), asleep: f64, in_bed: f64) -> SleepNight {
        SleepNight {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            asleep,
            in_bed,
            unspecified: 0.0,
            total: asleep + in_bed,
            sources: BTreeSet::from(["Watch".to_string()]),
        }
    }

    #[test]
    fn cutoff_boundary() {
        let rows = vec![
            night((2024, 11, 19), 8.0, 1.0),
            night((2024, 11, 20), 8.0, 1.0),
        ];
        let corrected = correct_rows(&rows, correction_cutoff());
        // The night before the cutoff is untouched; the cutoff night itself
        // is corrected
        assert_eq!(corrected[0].asleep, 8.0);
        assert_eq!(corrected[1].asleep, 7.0);
    }

    #[test]
    fn correction_floors_at_zero() {
        let rows = vec![night((2024, 12, 1), 0.5, 2.0)];
        let corrected = correct_rows(&rows, correction_cutoff());
        assert_eq!(corrected[0].asleep, 0.0);
    }

    #[test]
    fn input_rows_not_mutated() {
        let rows = vec![night((2024, 12, 1), 8.0, 1.0)];
        let _ = correct_rows(&rows, correction_cutoff());
        assert_eq!(rows[0].asleep, 8.0);
    }

    #[test]
    fn report_counts_changed_rows_only() {
        let rows = vec![
            night((2024, 11, 1), 8.0, 1.0),  // before cutoff
            night((2024, 11, 25), 8.0, 1.5), // changed
            night((2024, 11, 26), 7.0, 0.0), // in window but unchanged
            night((2024, 11, 27), 6.0, 0.5), // changed
        ];
        let corrected = correct_rows(&rows, correction_cutoff());
        let report = analyze(&rows, &corrected, correction_cutoff());
        assert_eq!(report.rows_processed, 4);
        assert_eq!(report.rows_in_window, 3);
        assert_eq!(report.rows_changed, 2);
        assert!((report.total_reduction_h - 2.0).abs() < 1e-9);
        assert!((report.average_reduction_h().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn engine_writes_corrected_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CorrectionEngine::new(dir.path());
        store::write_rows(&engine.original_path(), &[night((2024, 11, 20), 8.0, 1.0)]).unwrap();

        let report = engine.run(|_| false).unwrap();
        assert_eq!(report.rows_changed, 1);

        let corrected = store::read_sleep_rows(&engine.corrected_path()).unwrap();
        assert_eq!(corrected[0].asleep, 7.0);

        // Original untouched when the decision is "no"
        let original = store::read_sleep_rows(&engine.original_path()).unwrap();
        assert_eq!(original[0].asleep, 8.0);

        // Backup matches the pre-correction original
        let backup = store::read_sleep_rows(&engine.backup_path()).unwrap();
        assert_eq!(backup[0].asleep, 8.0);
    }

    #[test]
    fn engine_replaces_original_on_confirm() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CorrectionEngine::new(dir.path());
        store::write_rows(&engine.original_path(), &[night((2024, 11, 20), 8.0, 1.0)]).unwrap();

        engine.run(|_| true).unwrap();

        let original = store::read_sleep_rows(&engine.original_path()).unwrap();
        assert_eq!(original[0].asleep, 7.0);
        // The backup still holds the uncorrected value
        let backup = store::read_sleep_rows(&engine.backup_path()).unwrap();
        assert_eq!(backup[0].asleep, 8.0);
    }

    #[test]
    fn second_run_keeps_first_backup() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CorrectionEngine::new(dir.path());
        store::write_rows(&engine.original_path(), &[night((2024, 11, 20), 8.0, 1.0)]).unwrap();

        engine.run(|_| false).unwrap();
        let first_backup = fs::read_to_string(engine.backup_path()).unwrap();

        // Change the original, run again: the backup must not be rewritten
        store::write_rows(&engine.original_path(), &[night((2024, 11, 20), 9.0, 1.0)]).unwrap();
        engine.run(|_| false).unwrap();

        let second_backup = fs::read_to_string(engine.backup_path()).unwrap();
        assert_eq!(first_backup, second_backup);
    }

    #[test]
    fn missing_artifact_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CorrectionEngine::new(dir.path());
        let err = engine.run(|_| false).unwrap_err();
        assert!(matches!(err, ExtractError::MissingArtifact(_)));
        // Nothing was written
        assert!(!engine.corrected_path().exists());
        assert!(!engine.backup_path().exists());
    }

    #[test]
    fn malformed_row_aborts_before_any_write() {
        let dir = tempfile::tempdir().unwrap();
        let engine = CorrectionEngine::new(dir.path());
        fs::write(
            engine.original_path(),
            r#"[{"date": "2024-11-20", "asleep": 8.0}]"#,
        )
        .unwrap();

        let err = engine.run(|_| false).unwrap_err();
        assert!(matches!(err, ExtractError::Json(_)));
        assert!(!engine.corrected_path().exists());
        assert!(!engine.backup_path().exists());
    }
}
