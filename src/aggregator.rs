//! Daily aggregation
//!
//! Folds normalized quantity samples into one summary row per calendar day.
//! Steps, energy, and distance sum within the day; resting heart rate reduces
//! to the day's mean with min/max and the reading count retained. Buckets
//! exist only when at least one valid sample falls in them, and output is
//! always sorted ascending by date.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::types::{DistanceDay, EnergyDay, QuantitySample, RestingHrDay, StepDay};

#[derive(Default)]
struct SumAcc {
    total: f64,
    sources: BTreeSet<String>,
}

fn fold_sums(samples: &[QuantitySample]) -> BTreeMap<NaiveDate, SumAcc> {
    let mut days: BTreeMap<NaiveDate, SumAcc> = BTreeMap::new();
    for sample in samples {
        let acc = days.entry(sample.date).or_default();
        acc.total += sample.value;
        acc.sources.insert(sample.source.clone());
    }
    days
}

pub fn aggregate_steps(samples: &[QuantitySample]) -> Vec<StepDay> {
    fold_sums(samples)
        .into_iter()
        .map(|(date, acc)| StepDay {
            date,
            steps: acc.total as i64,
            sources: acc.sources,
        })
        .collect()
}

pub fn aggregate_energy(samples: &[QuantitySample]) -> Vec<EnergyDay> {
    fold_sums(samples)
        .into_iter()
        .map(|(date, acc)| EnergyDay {
            date,
            active_calories: acc.total,
            sources: acc.sources,
        })
        .collect()
}

pub fn aggregate_distance(samples: &[QuantitySample]) -> Vec<DistanceDay> {
    fold_sums(samples)
        .into_iter()
        .map(|(date, acc)| DistanceDay {
            date,
            distance_km: round_to(acc.total, 2),
            sources: acc.sources,
        })
        .collect()
}

/// Resting heart rate keeps every reading until the fold so the row can carry
/// mean, min, max, and the reading count.
pub fn aggregate_resting_hr(samples: &[QuantitySample]) -> Vec<RestingHrDay> {
    #[derive(Default)]
    struct HrAcc {
        values: Vec<f64>,
        sources: BTreeSet<String>,
    }

    let mut days: BTreeMap<NaiveDate, HrAcc> = BTreeMap::new();
    for sample in samples {
        let acc = days.entry(sample.date).or_default();
        acc.values.push(sample.value);
        acc.sources.insert(sample.source.clone());
    }

    days.into_iter()
        .map(|(date, acc)| {
            let readings = acc.values.len();
            let mean = acc.values.iter().sum::<f64>() / readings as f64;
            let min_hr = acc.values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max_hr = acc.values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            RestingHrDay {
                date,
                resting_hr: round_to(mean, 1),
                min_hr,
                max_hr,
                readings,
                sources: acc.sources,
            }
        })
        .collect()
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
