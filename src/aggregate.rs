//! Daily and multi-day aggregation over the activity log
//!
//! Everything here is recomputed from the log on demand; nothing is cached.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::activity_log::ActivityLog;
use crate::models::{round2, ActivityKind, DailyAggregate, Entry, Goals};

/// Sum a set of entries into a daily aggregate
pub fn aggregate_entries<'a, I>(entries: I) -> DailyAggregate
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut aggregate = DailyAggregate::default();
    let mut hr_sum = 0.0;
    let mut hr_weight = 0.0;

    for entry in entries {
        aggregate.steps += u64::from(entry.steps);
        aggregate.duration_minutes += entry.duration_minutes;
        aggregate.calories += u64::from(entry.calories);
        aggregate.distance_km += entry.distance_km;

        if entry.heart_rate > 0 && entry.duration_minutes > 0.0 {
            hr_sum += f64::from(entry.heart_rate) * entry.duration_minutes;
            hr_weight += entry.duration_minutes;
        }
    }

    aggregate.distance_km = round2(aggregate.distance_km);
    aggregate.average_heart_rate = if hr_weight > 0.0 {
        (hr_sum / hr_weight).round() as u32
    } else {
        0
    };

    aggregate
}

/// Totals for one day; zero for a date with no entries
pub fn aggregate_day(log: &ActivityLog, date: NaiveDate) -> DailyAggregate {
    aggregate_entries(log.entries_for(date))
}

/// Totals for one day restricted to a single activity kind
pub fn aggregate_day_for_kind(log: &ActivityLog, date: NaiveDate, kind: ActivityKind) -> DailyAggregate {
    aggregate_entries(log.entries_for(date).iter().filter(|e| e.activity_kind == kind))
}

/// Minutes per activity kind on a date, every kind present (stacked charts)
pub fn duration_by_kind(log: &ActivityLog, date: NaiveDate) -> BTreeMap<ActivityKind, f64> {
    ActivityKind::ALL
        .iter()
        .map(|kind| (*kind, log.duration_for_kind(date, *kind)))
        .collect()
}

/// Totals across a sequence of days
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeTotals {
    pub steps: u64,
    pub calories: u64,
    pub duration_minutes: f64,
    pub distance_km: f64,
    /// Mean of the daily averages, zero days included
    pub average_heart_rate_across_days: u32,
}

/// Per-day aggregates plus range totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeAggregate {
    pub per_day: BTreeMap<NaiveDate, DailyAggregate>,
    pub totals: RangeTotals,
}

/// Aggregate each of `dates` and total them. A repeated date counts once.
pub fn aggregate_range<I>(log: &ActivityLog, dates: I) -> RangeAggregate
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut per_day = BTreeMap::new();
    let mut totals = RangeTotals::default();
    let mut hr_sum: u64 = 0;
    let mut day_count: u64 = 0;

    for date in dates {
        if per_day.contains_key(&date) {
            continue;
        }
        let day = aggregate_day(log, date);
        totals.steps += day.steps;
        totals.calories += day.calories;
        totals.duration_minutes += day.duration_minutes;
        totals.distance_km += day.distance_km;
        hr_sum += u64::from(day.average_heart_rate);
        day_count += 1;
        per_day.insert(date, day);
    }

    totals.distance_km = round2(totals.distance_km);
    totals.average_heart_rate_across_days = if day_count > 0 {
        (hr_sum as f64 / day_count as f64).round() as u32
    } else {
        0
    };

    RangeAggregate { per_day, totals }
}

/// Inclusive date bounds; an open end is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// The `days` days ending at `end`, inclusive, starting no earlier than `NaiveDate::MIN`
    pub fn trailing(end: NaiveDate, days: u32) -> Self {
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days.max(1)) - 1))
            .unwrap_or(NaiveDate::MIN);
        DateRange::new(Some(start), Some(end))
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= &start);
        let before_end = self.end.map_or(true, |end| date <= &end);
        after_start && before_end
    }

    /// Logged dates inside the range, ascending
    pub fn dates_in(&self, log: &ActivityLog) -> Vec<NaiveDate> {
        log.dates().filter(|d| self.contains(d)).collect()
    }
}

/// Range aggregate over the logged dates inside `range` (summary cards)
pub fn summarize(log: &ActivityLog, range: &DateRange) -> RangeAggregate {
    aggregate_range(log, range.dates_in(log))
}

/// True iff each of the `window_days` days ending at `reference` has an entry
pub fn compute_streak(log: &ActivityLog, reference: NaiveDate, window_days: u32) -> bool {
    (0..window_days).all(|offset| {
        reference
            .checked_sub_signed(Duration::days(i64::from(offset)))
            .is_some_and(|date| log.has_entries(date))
    })
}

/// Number of consecutive active days ending at `reference`
pub fn current_streak(log: &ActivityLog, reference: NaiveDate) -> u32 {
    let mut length = 0;
    let mut date = reference;
    while log.has_entries(date) {
        length += 1;
        match date.pred_opt() {
            Some(previous) => date = previous,
            None => break,
        }
    }
    length
}

/// One cell of the calendar month view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub has_entries: bool,
    pub aggregate: DailyAggregate,
}

/// A calendar month with per-day aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Blank cells before the 1st, Sunday = 0
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
}

/// Build the month view; `None` for an invalid year/month
pub fn month_view(log: &ActivityLog, year: i32, month: u32) -> Option<MonthView> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let days = first
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| CalendarDay {
            date,
            has_entries: log.has_entries(date),
            aggregate: aggregate_day(log, date),
        })
        .collect();

    Some(MonthView {
        year,
        month,
        leading_blanks: first.weekday().num_days_from_sunday(),
        days,
    })
}

/// Progress of one day against the goals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub steps_fraction: f64,
    pub calories_fraction: f64,
    pub duration_fraction: f64,
}

impl GoalProgress {
    pub fn evaluate(aggregate: &DailyAggregate, goals: &Goals) -> Self {
        GoalProgress {
            steps_fraction: fraction(aggregate.steps as f64, f64::from(goals.steps)),
            calories_fraction: fraction(aggregate.calories as f64, f64::from(goals.calories)),
            duration_fraction: fraction(aggregate.duration_minutes, goals.duration_minutes),
        }
    }

    pub fn steps_met(&self) -> bool {
        self.steps_fraction >= 1.0
    }

    pub fn calories_met(&self) -> bool {
        self.calories_fraction >= 1.0
    }

    pub fn duration_met(&self) -> bool {
        self.duration_fraction >= 1.0
    }

    pub fn all_met(&self) -> bool {
        self.steps_met() && self.calories_met() && self.duration_met()
    }
}

/// A zero target counts as already met
fn fraction(value: f64, target: f64) -> f64 {
    if target > 0.0 {
        value / target
    } else {
        1.0
    }
}
