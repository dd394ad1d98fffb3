//! Healthfold - daily and nightly aggregation for personal health exports
//!
//! Healthfold turns a health-data XML export into per-metric JSON summaries
//! through a deterministic pipeline: record parsing → normalization/filtering
//! → daily (or nightly) aggregation → artifact persistence. A separate
//! correction engine post-processes the sleep artifact to repair a known
//! measurement artifact from a fixed date onward.
//!
//! ## Modules
//!
//! - **parser**: stream the export and lift raw record attributes
//! - **normalizer**: per-metric validation, unit conversion, bucket keys
//! - **aggregator** / **sleep**: daily and nightly reductions
//! - **store**: JSON artifact persistence
//! - **correction**: date-gated sleep correction with backup-once semantics
//! - **pipeline**: whole-export orchestration

pub mod aggregator;
pub mod correction;
pub mod error;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod sleep;
pub mod store;
pub mod types;

pub use correction::{correction_cutoff, CorrectionEngine, CorrectionReport};
pub use error::ExtractError;
pub use parser::ExportReader;
pub use pipeline::{ExtractReport, Extractor, DEFAULT_DATA_DIR, DEFAULT_EXPORT_PATH};
pub use types::MetricKind;

/// Healthfold version, embedded in CLI output
pub const HEALTHFOLD_VERSION: &str = env!("CARGO_PKG_VERSION");
