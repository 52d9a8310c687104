//! Property tests for the activity log and its aggregates

use activelog::aggregate::{aggregate_day, aggregate_range, compute_streak, current_streak};
use activelog::export::csv::to_csv_string;
use activelog::import::csv::CsvImporter;
use activelog::models::{ActivityKind, Entry};
use activelog::ActivityLog;
use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn kind_strategy() -> impl Strategy<Value = ActivityKind> {
    prop_oneof![
        Just(ActivityKind::Walking),
        Just(ActivityKind::Jogging),
        Just(ActivityKind::Cycling),
        Just(ActivityKind::Swimming),
    ]
}

prop_compose! {
    fn entry_strategy()(
        kind in kind_strategy(),
        steps in 0u32..20_000,
        duration in 0u32..240,
        distance_hundredths in 0u32..5_000,
        calories in 0u32..2_000,
        heart_rate in prop_oneof![Just(0u32), 40u32..190],
        notes in "[a-z ,\"]{0,12}",
    ) -> Entry {
        Entry {
            id: activelog::models::new_entry_id(),
            activity_kind: kind,
            steps,
            duration_minutes: f64::from(duration),
            distance_km: f64::from(distance_hundredths) / 100.0,
            calories,
            heart_rate,
            notes,
        }
    }
}

fn dated_entries() -> impl Strategy<Value = Vec<(NaiveDate, Entry)>> {
    prop::collection::vec(
        (0i64..30, entry_strategy()).prop_map(|(offset, entry)| (base_date() + Duration::days(offset), entry)),
        0..40,
    )
}

proptest! {
    #[test]
    fn prop_removing_everything_leaves_no_days(entries in dated_entries()) {
        let mut log: ActivityLog = entries.clone().into_iter().collect();
        prop_assert_eq!(log.entry_count(), entries.len());

        for (date, entry) in &entries {
            log.remove_entry(*date, &entry.id).unwrap();
            for d in log.dates() {
                prop_assert!(!log.entries_for(d).is_empty());
            }
        }
        prop_assert!(log.is_empty());
    }

    #[test]
    fn prop_daily_totals_match_entries(entries in dated_entries()) {
        let log: ActivityLog = entries.into_iter().collect();

        for date in log.dates() {
            let day = aggregate_day(&log, date);
            let steps: u64 = log.entries_for(date).iter().map(|e| u64::from(e.steps)).sum();
            let calories: u64 = log.entries_for(date).iter().map(|e| u64::from(e.calories)).sum();
            prop_assert_eq!(day.steps, steps);
            prop_assert_eq!(day.calories, calories);

            let rates: Vec<u32> = log
                .entries_for(date)
                .iter()
                .filter(|e| e.heart_rate > 0 && e.duration_minutes > 0.0)
                .map(|e| e.heart_rate)
                .collect();
            if rates.is_empty() {
                prop_assert_eq!(day.average_heart_rate, 0);
            } else {
                prop_assert!(day.average_heart_rate >= *rates.iter().min().unwrap());
                prop_assert!(day.average_heart_rate <= *rates.iter().max().unwrap());
            }
        }
    }

    #[test]
    fn prop_range_totals_sum_days(entries in dated_entries()) {
        let log: ActivityLog = entries.into_iter().collect();
        let range = aggregate_range(&log, log.dates());

        let steps: u64 = range.per_day.values().map(|d| d.steps).sum();
        prop_assert_eq!(range.totals.steps, steps);
        prop_assert_eq!(range.per_day.len(), log.day_count());
    }

    #[test]
    fn prop_streak_agrees_with_current_streak(entries in dated_entries(), window in 0u32..10) {
        let log: ActivityLog = entries.into_iter().collect();
        let reference = base_date() + Duration::days(29);

        let streak = current_streak(&log, reference);
        prop_assert_eq!(compute_streak(&log, reference, window), window <= streak);
    }

    #[test]
    fn prop_csv_preserves_entries(entries in dated_entries()) {
        let log: ActivityLog = entries.into_iter().collect();
        let csv = to_csv_string(&log).unwrap();
        let rows = CsvImporter::new().read_csv(csv.as_bytes()).unwrap();

        let original: Vec<_> = log.iter().collect();
        prop_assert_eq!(rows.len(), original.len());
        for ((d1, e1), (d2, e2)) in original.iter().zip(rows.iter()) {
            prop_assert_eq!(d1, d2);
            prop_assert!(e1.same_activity(e2));
        }
    }
}
