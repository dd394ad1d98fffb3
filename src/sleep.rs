//! Sleep night aggregation
//!
//! Folds normalized sleep sessions into one row per night. Naps are excluded
//! entirely: a night with only naps produces no row. Each session's duration
//! lands in exactly one of the asleep/in-bed/unspecified buckets by its
//! classified category, and unconditionally in the night's total.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::types::{SleepCategory, SleepNight, SleepSample};

#[derive(Default)]
struct NightAcc {
    asleep: f64,
    in_bed: f64,
    unspecified: f64,
    total: f64,
    sources: BTreeSet<String>,
}

pub fn aggregate_nights(samples: &[SleepSample]) -> Vec<SleepNight> {
    let mut nights: BTreeMap<NaiveDate, NightAcc> = BTreeMap::new();

    for sample in samples {
        if sample.is_nap {
            continue;
        }

        let acc = nights.entry(sample.night_date).or_default();
        acc.sources.insert(sample.source.clone());

        match sample.category {
            SleepCategory::Asleep => acc.asleep += sample.duration_h,
            SleepCategory::InBed => acc.in_bed += sample.duration_h,
            SleepCategory::Unspecified => acc.unspecified += sample.duration_h,
        }
        acc.total += sample.duration_h;
    }

    nights
        .into_iter()
        .map(|(date, acc)| SleepNight {
            date,
            asleep: acc.asleep,
            in_bed: acc.in_bed,
            unspecified: acc.unspecified,
            total: acc.total,
            sources: acc.sources,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn session(
        category: SleepCategory,
        duration_h: f64,
        night: (i32, u32, u32),
        is_nap: bool,
        source: &str,
    ) -> SleepSample {
        let start = DateTime::parse_from_str("2024-01-01 23:00:00 +0000", "%Y-%m-%d %H:%M:%S %z")
            .unwrap();
        SleepSample {
            category,
            duration_h,
            start,
            end: start,
            source: source.to_string(),
            night_date: NaiveDate::from_ymd_opt(night.0, night.1, night.2).unwrap(),
            is_nap,
        }
    }

    #[test]
    fn categories_fold_into_their_buckets() {
        let samples = vec![
            session(SleepCategory::Asleep, 6.5, (2024, 1, 1), false, "Watch"),
            session(SleepCategory::InBed, 1.0, (2024, 1, 1), false, "Phone"),
            session(SleepCategory::Unspecified, 0.5, (2024, 1, 1), false, "Watch"),
        ];
        let rows = aggregate_nights(&samples);
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!((row.asleep - 6.5).abs() < 1e-9);
        assert!((row.in_bed - 1.0).abs() < 1e-9);
        assert!((row.unspecified - 0.5).abs() < 1e-9);
        assert!((row.total - 8.0).abs() < 1e-9);
        assert_eq!(row.sources.len(), 2);
    }

    #[test]
    fn naps_never_touch_a_bucket() {
        // A nap contributes nothing even when real night sleep exists
        let samples = vec![
            session(SleepCategory::Asleep, 1.5, (2024, 1, 1), true, "Watch"),
            session(SleepCategory::Asleep, 7.0, (2024, 1, 1), false, "Watch"),
        ];
        let rows = aggregate_nights(&samples);
        assert_eq!(rows.len(), 1);
        assert!((rows[0].total - 7.0).abs() < 1e-9);
    }

    #[test]
    fn nap_only_night_has_no_row() {
        let samples = vec![session(SleepCategory::Asleep, 1.5, (2024, 1, 1), true, "Watch")];
        assert!(aggregate_nights(&samples).is_empty());
    }

    #[test]
    fn nights_sorted_and_separate() {
        let samples = vec![
            session(SleepCategory::Asleep, 7.0, (2024, 1, 2), false, "Watch"),
            session(SleepCategory::Asleep, 6.0, (2024, 1, 1), false, "Watch"),
        ];
        let rows = aggregate_nights(&samples);
        assert_eq!(rows.len(), 2);
        assert!(rows[0].date < rows[1].date);
        assert!((rows[0].asleep - 6.0).abs() < 1e-9);
    }
}
