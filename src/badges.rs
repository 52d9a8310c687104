//! Achievement badges
//!
//! The badge set is a pure function of the log and the reference date; it is
//! recomputed in full on every call.

use chrono::NaiveDate;

use crate::activity_log::ActivityLog;
use crate::aggregate::{aggregate_day, compute_streak};
use crate::config::BadgeThresholds;
use crate::models::Badge;

/// Evaluate the badge set against the default thresholds
pub fn compute_badges(log: &ActivityLog, today: NaiveDate) -> Vec<Badge> {
    compute_badges_with(log, today, &BadgeThresholds::default())
}

/// Evaluate the badge set, in display order
pub fn compute_badges_with(
    log: &ActivityLog,
    today: NaiveDate,
    thresholds: &BadgeThresholds,
) -> Vec<Badge> {
    let mut badges = Vec::new();

    let daily: Vec<_> = log.dates().map(|d| aggregate_day(log, d)).collect();

    if daily.iter().any(|a| a.steps >= thresholds.daily_steps) {
        badges.push(Badge {
            title: format!("{} Steps Day", compact_count(thresholds.daily_steps)),
            description: format!(
                "You hit {}+ steps in a day",
                group_thousands(thresholds.daily_steps)
            ),
        });
    }

    if thresholds.streak_days > 0 && compute_streak(log, today, thresholds.streak_days) {
        badges.push(Badge {
            title: format!("{}-Day Streak", thresholds.streak_days),
            description: format!("Active {} consecutive days", thresholds.streak_days),
        });
    }

    let total_distance: f64 = daily.iter().map(|a| a.distance_km).sum();
    if total_distance >= thresholds.total_distance_km {
        badges.push(Badge {
            title: format!("{} km Total", thresholds.total_distance_km),
            description: format!("You traveled {} km total", total_distance.round()),
        });
    }

    if !log.is_empty() {
        badges.push(Badge {
            title: "Getting Started".to_string(),
            description: "You created your first activity".to_string(),
        });
    }

    tracing::debug!(count = badges.len(), "Computed badges");
    badges
}

/// `10000` -> `10k`
fn compact_count(n: u64) -> String {
    if n >= 1000 && n % 1000 == 0 {
        format!("{}k", n / 1000)
    } else {
        n.to_string()
    }
}

/// `10000` -> `10,000`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
