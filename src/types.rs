//! Core types for the extraction pipeline
//!
//! This module defines the data that flows through each stage: raw attribute
//! records lifted from the export XML, normalized per-metric samples, and the
//! daily/nightly summary rows that are persisted as JSON artifacts.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Record categories extracted from the export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    StepCount,
    ActiveEnergy,
    DistanceWalkingRunning,
    RestingHeartRate,
    SleepAnalysis,
}

impl MetricKind {
    /// All extractable categories, in pipeline order
    pub const ALL: [MetricKind; 5] = [
        MetricKind::StepCount,
        MetricKind::ActiveEnergy,
        MetricKind::DistanceWalkingRunning,
        MetricKind::RestingHeartRate,
        MetricKind::SleepAnalysis,
    ];

    /// The `type` attribute value that selects this category in the export
    pub fn discriminator(&self) -> &'static str {
        match self {
            MetricKind::StepCount => "HKQuantityTypeIdentifierStepCount",
            MetricKind::ActiveEnergy => "HKQuantityTypeIdentifierActiveEnergyBurned",
            MetricKind::DistanceWalkingRunning => "HKQuantityTypeIdentifierDistanceWalkingRunning",
            MetricKind::RestingHeartRate => "HKQuantityTypeIdentifierRestingHeartRate",
            MetricKind::SleepAnalysis => "HKCategoryTypeIdentifierSleepAnalysis",
        }
    }

    /// File name of the persisted summary artifact for this category
    pub fn artifact_name(&self) -> &'static str {
        match self {
            MetricKind::StepCount => "step_count_data.json",
            MetricKind::ActiveEnergy => "active_energy_data.json",
            MetricKind::DistanceWalkingRunning => "distance_data.json",
            MetricKind::RestingHeartRate => "resting_hr_data.json",
            MetricKind::SleepAnalysis => "sleep_data.json",
        }
    }

    /// Unit assumed when a record carries no `unit` attribute
    pub fn default_unit(&self) -> &'static str {
        match self {
            MetricKind::StepCount => "count",
            MetricKind::ActiveEnergy => "kcal",
            MetricKind::DistanceWalkingRunning => "km",
            MetricKind::RestingHeartRate => "count/min",
            MetricKind::SleepAnalysis => "",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::StepCount => "step_count",
            MetricKind::ActiveEnergy => "active_energy",
            MetricKind::DistanceWalkingRunning => "distance",
            MetricKind::RestingHeartRate => "resting_hr",
            MetricKind::SleepAnalysis => "sleep",
        }
    }
}

/// Raw string attributes of one `Record` element, before any parsing
///
/// Every field is kept exactly as it appears in the export; validation and
/// coercion happen in the normalizer so a bad record can be skipped without
/// aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub value: Option<String>,
    pub unit: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub source_name: Option<String>,
}

/// A validated numeric sample for one of the quantity metrics
#[derive(Debug, Clone, PartialEq)]
pub struct QuantitySample {
    pub value: f64,
    pub unit: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub source: String,
    /// Calendar date of `start` in the record's local offset, used as the
    /// daily bucket key
    pub date: NaiveDate,
}

/// Sleep record classification, by label substring with fixed precedence:
/// `Asleep` wins over `InBed`, anything else is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepCategory {
    Asleep,
    InBed,
    Unspecified,
}

impl SleepCategory {
    pub fn classify(label: &str) -> Self {
        if label.contains("Asleep") {
            SleepCategory::Asleep
        } else if label.contains("InBed") {
            SleepCategory::InBed
        } else {
            SleepCategory::Unspecified
        }
    }
}

/// A validated sleep session, attributed to a night
#[derive(Debug, Clone, PartialEq)]
pub struct SleepSample {
    pub category: SleepCategory,
    /// Session length in hours
    pub duration_h: f64,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub source: String,
    /// The night this session belongs to; sessions starting before the
    /// rollover hour are attributed to the previous calendar day
    pub night_date: NaiveDate,
    /// Daytime sessions are flagged here and excluded from night aggregation
    pub is_nap: bool,
}

/// One day of summed step counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDay {
    pub date: NaiveDate,
    pub steps: i64,
    pub sources: BTreeSet<String>,
}

/// One day of summed active energy (kcal)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDay {
    pub date: NaiveDate,
    pub active_calories: f64,
    pub sources: BTreeSet<String>,
}

/// One day of summed walking/running distance (km)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceDay {
    pub date: NaiveDate,
    pub distance_km: f64,
    pub sources: BTreeSet<String>,
}

/// One day of resting heart rate readings, reduced to their mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestingHrDay {
    pub date: NaiveDate,
    /// Mean of the day's readings, one decimal
    pub resting_hr: f64,
    pub min_hr: f64,
    pub max_hr: f64,
    pub readings: usize,
    pub sources: BTreeSet<String>,
}

/// One night of categorized sleep hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepNight {
    pub date: NaiveDate,
    pub asleep: f64,
    pub in_bed: f64,
    pub unspecified: f64,
    pub total: f64,
    pub sources: BTreeSet<String>,
}
