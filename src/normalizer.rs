//! Record normalization and filtering
//!
//! Converts raw string records into validated, typed samples, one rule set per
//! metric: unit conversion, range checks, daily bucket keys, and the sleep
//! specifics (night-date rollover and nap detection). Rejected records are
//! counted and logged, never retried.

use chrono::{DateTime, Duration, FixedOffset, Timelike};
use log::warn;

use crate::types::{MetricKind, QuantitySample, RawRecord, SleepCategory, SleepSample};

/// Timestamp format used by the export, e.g. `2024-01-01 09:00:00 +0000`
const EXPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Sleep sessions starting before this local hour belong to the previous
/// night
pub const NIGHT_ROLLOVER_HOUR: u32 = 6;

/// Nap window bounds, exclusive on both ends: a session starting strictly
/// between these local hours is a nap.
pub const NAP_WINDOW_START_HOUR: u32 = 8;
pub const NAP_WINDOW_END_HOUR: u32 = 18;

/// Sleep sessions shorter than this many hours are discarded as artifacts
pub const MIN_SLEEP_HOURS: f64 = 0.1;
/// Sleep sessions longer than this many hours are discarded as artifacts
pub const MAX_SLEEP_HOURS: f64 = 24.0;

/// Resting heart rates above this are treated as sensor artifacts
pub const MAX_RESTING_HR: f64 = 200.0;

/// Miles to kilometers conversion factor
pub const MILES_TO_KM: f64 = 1.60934;

/// Result of normalizing one metric's raw records
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome<T> {
    pub samples: Vec<T>,
    /// Records rejected by parsing or validation
    pub skipped: usize,
}

/// Parse an export timestamp, preserving its UTC offset
pub fn parse_export_datetime(text: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_str(text, EXPORT_DATETIME_FORMAT)
}

/// Normalize raw records for one of the quantity metrics (steps, energy,
/// distance, resting heart rate). Sleep records go through
/// [`normalize_sleep`] instead.
pub fn normalize_quantity(kind: MetricKind, raw: &[RawRecord]) -> NormalizeOutcome<QuantitySample> {
    debug_assert_ne!(kind, MetricKind::SleepAnalysis);

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for record in raw {
        match quantity_sample(kind, record) {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => skipped += 1,
            Err(reason) => {
                warn!("skipping {} record: {}", kind.as_str(), reason);
                skipped += 1;
            }
        }
    }

    NormalizeOutcome { samples, skipped }
}

/// Validate one quantity record. `Ok(None)` means the record is valid XML but
/// fails the metric's range predicate; `Err` means a field failed to parse.
fn quantity_sample(kind: MetricKind, record: &RawRecord) -> Result<Option<QuantitySample>, String> {
    let start = parse_export_datetime(&record.start_date)
        .map_err(|e| format!("bad startDate {:?}: {}", record.start_date, e))?;
    let end = parse_export_datetime(&record.end_date)
        .map_err(|e| format!("bad endDate {:?}: {}", record.end_date, e))?;

    let value_text = record.value.as_deref().unwrap_or("0");
    let parsed: f64 = value_text
        .parse()
        .map_err(|e| format!("bad value {:?}: {}", value_text, e))?;

    let mut unit = record
        .unit
        .clone()
        .unwrap_or_else(|| kind.default_unit().to_string());

    let value = match kind {
        // Step counts are integral; fractional values are truncated
        MetricKind::StepCount => {
            let steps = parsed.trunc();
            if steps <= 0.0 {
                return Ok(None);
            }
            steps
        }
        MetricKind::ActiveEnergy => {
            if parsed <= 0.0 {
                return Ok(None);
            }
            parsed
        }
        MetricKind::DistanceWalkingRunning => {
            let km = if unit == "mi" {
                unit = "km".to_string();
                parsed * MILES_TO_KM
            } else {
                parsed
            };
            if km <= 0.0 {
                return Ok(None);
            }
            km
        }
        MetricKind::RestingHeartRate => {
            if parsed <= 0.0 || parsed > MAX_RESTING_HR {
                return Ok(None);
            }
            parsed
        }
        MetricKind::SleepAnalysis => unreachable!("sleep goes through normalize_sleep"),
    };

    let source = record
        .source_name
        .clone()
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Some(QuantitySample {
        value,
        unit,
        start,
        end,
        source,
        date: start.date_naive(),
    }))
}

/// Normalize raw sleep records: compute duration, classify the label, flag
/// naps, and attribute each session to its night.
pub fn normalize_sleep(raw: &[RawRecord]) -> NormalizeOutcome<SleepSample> {
    let mut samples = Vec::new();
    let mut skipped = 0usize;

    for record in raw {
        match sleep_sample(record) {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => skipped += 1,
            Err(reason) => {
                warn!("skipping sleep record: {}", reason);
                skipped += 1;
            }
        }
    }

    NormalizeOutcome { samples, skipped }
}

fn sleep_sample(record: &RawRecord) -> Result<Option<SleepSample>, String> {
    let start = parse_export_datetime(&record.start_date)
        .map_err(|e| format!("bad startDate {:?}: {}", record.start_date, e))?;
    let end = parse_export_datetime(&record.end_date)
        .map_err(|e| format!("bad endDate {:?}: {}", record.end_date, e))?;

    let duration_h = end.signed_duration_since(start).num_seconds() as f64 / 3600.0;

    // Guards against malformed or multi-day erroneous spans, and covers
    // end-before-start records (negative duration)
    if duration_h < MIN_SLEEP_HOURS || duration_h > MAX_SLEEP_HOURS {
        return Ok(None);
    }

    let category = SleepCategory::classify(record.value.as_deref().unwrap_or(""));

    let hour = start.hour();
    let is_nap = hour > NAP_WINDOW_START_HOUR && hour < NAP_WINDOW_END_HOUR;

    let night_date = if hour < NIGHT_ROLLOVER_HOUR {
        start.date_naive() - Duration::days(1)
    } else {
        start.date_naive()
    };

    let source = record
        .source_name
        .clone()
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Some(SleepSample {
        category,
        duration_h,
        start,
        end,
        source,
        night_date,
        is_nap,
    }))
}
