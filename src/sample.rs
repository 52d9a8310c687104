use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::estimator::MetricsEstimator;
use crate::models::{ActivityKind, Entry, PartialMetrics, Profile};

pub const DEFAULT_SAMPLE_DAYS: u32 = 10;
pub const SAMPLE_NOTES: &str = "sample";

/// Random activities for `today` and the `days - 1` days before it.
///
/// Each day gets 1-3 entries of 15-64 whole minutes, completed from duration
/// alone. Output is grouped by date, newest first, and stops at `NaiveDate::MIN`.
pub fn generate_sample_data<R: Rng>(
    estimator: &MetricsEstimator,
    profile: &Profile,
    today: NaiveDate,
    days: u32,
    rng: &mut R,
) -> Vec<(NaiveDate, Entry)> {
    let mut entries = Vec::new();

    for offset in 0..days {
        let Some(date) = today.checked_sub_signed(Duration::days(i64::from(offset))) else {
            break;
        };
        let count = rng.gen_range(1..=3);

        for _ in 0..count {
            let kind = *ActivityKind::ALL
                .choose(rng)
                .unwrap_or(&ActivityKind::Walking);
            let minutes = f64::from(rng.gen_range(15u32..65));
            let entry = estimator.build_entry(
                kind,
                profile,
                PartialMetrics::from_duration(minutes),
                SAMPLE_NOTES,
            );
            entries.push((date, entry));
        }
    }

    tracing::debug!(days, entries = entries.len(), "Generated sample data");
    entries
}
