//! Pipeline orchestration
//!
//! One parse → normalize → aggregate → persist pass per metric, plus a
//! whole-export run over every category. Each run builds its accumulators
//! from scratch and reports how many records it saw, skipped, and wrote.

use std::path::{Path, PathBuf};

use log::info;

use crate::aggregator;
use crate::error::ExtractError;
use crate::normalizer;
use crate::parser::ExportReader;
use crate::sleep;
use crate::store;
use crate::types::MetricKind;

/// Conventional location of the export inside a working directory
pub const DEFAULT_EXPORT_PATH: &str = "apple_health_export/export.xml";
/// Conventional output directory for the summary artifacts
pub const DEFAULT_DATA_DIR: &str = "data";

/// Per-metric outcome of one extraction pass
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractReport {
    pub kind: MetricKind,
    /// Records matching the metric's discriminator in the export
    pub records_found: usize,
    /// Records rejected by parsing or validation
    pub records_skipped: usize,
    /// Summary rows written to the artifact
    pub rows_written: usize,
    pub artifact: PathBuf,
}

/// Batch extractor over one export file
#[derive(Debug)]
pub struct Extractor {
    reader: ExportReader,
    data_dir: PathBuf,
}

impl Extractor {
    /// Open the export and fix the output directory. Fails before any
    /// parsing when the export is missing.
    pub fn new(
        export_path: impl Into<PathBuf>,
        data_dir: impl Into<PathBuf>,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            reader: ExportReader::open(export_path)?,
            data_dir: data_dir.into(),
        })
    }

    pub fn export_path(&self) -> &Path {
        self.reader.path()
    }

    /// Extract, aggregate, and persist one metric
    pub fn run_metric(&self, kind: MetricKind) -> Result<ExtractReport, ExtractError> {
        info!("extracting {} records from {}", kind.as_str(), self.reader.path().display());
        let raw = self.reader.records(kind)?;
        let artifact = self.data_dir.join(kind.artifact_name());

        let (records_skipped, rows_written) = match kind {
            MetricKind::StepCount => {
                let out = normalizer::normalize_quantity(kind, &raw);
                let rows = aggregator::aggregate_steps(&out.samples);
                store::write_rows(&artifact, &rows)?;
                (out.skipped, rows.len())
            }
            MetricKind::ActiveEnergy => {
                let out = normalizer::normalize_quantity(kind, &raw);
                let rows = aggregator::aggregate_energy(&out.samples);
                store::write_rows(&artifact, &rows)?;
                (out.skipped, rows.len())
            }
            MetricKind::DistanceWalkingRunning => {
                let out = normalizer::normalize_quantity(kind, &raw);
                let rows = aggregator::aggregate_distance(&out.samples);
                store::write_rows(&artifact, &rows)?;
                (out.skipped, rows.len())
            }
            MetricKind::RestingHeartRate => {
                let out = normalizer::normalize_quantity(kind, &raw);
                let rows = aggregator::aggregate_resting_hr(&out.samples);
                store::write_rows(&artifact, &rows)?;
                (out.skipped, rows.len())
            }
            MetricKind::SleepAnalysis => {
                let out = normalizer::normalize_sleep(&raw);
                let rows = sleep::aggregate_nights(&out.samples);
                store::write_rows(&artifact, &rows)?;
                (out.skipped, rows.len())
            }
        };

        Ok(ExtractReport {
            kind,
            records_found: raw.len(),
            records_skipped,
            rows_written,
            artifact,
        })
    }

    /// Run every metric category over the export, in pipeline order
    pub fn run_all(&self) -> Result<Vec<ExtractReport>, ExtractError> {
        MetricKind::ALL.iter().map(|&kind| self.run_metric(kind)).collect()
    }
}
