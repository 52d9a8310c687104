//! Metrics estimation from partial user input
//!
//! Given an activity kind, a profile and whichever of steps, duration and
//! distance the user supplied, fills in the rest and derives calories and an
//! estimated heart rate.

use rand::Rng;
use tracing::{debug, warn};

use crate::config::{EstimatorSettings, MAX_HEART_RATE_JITTER_BPM};
use crate::error::Result;
use crate::models::{round2, ActivityKind, CompletedMetrics, Entry, PartialMetrics, Profile};

/// Upper bound for any estimated heart rate
pub const MAX_ESTIMATED_HEART_RATE: u32 = 190;

/// Per-activity constants used by the estimator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityConstants {
    /// Steps per minute when steps are derived from duration
    pub steps_per_minute: Option<f64>,
    /// Kilometres per step when distance is derived from steps
    pub km_per_step: Option<f64>,
    /// Kilometres per minute when distance is derived from duration
    pub km_per_minute: Option<f64>,
    /// MET-style calorie multiplier
    pub met: f64,
    /// Fraction of heart rate reserve used during the activity
    pub heart_rate_intensity: f64,
}

impl ActivityConstants {
    pub fn for_kind(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::Walking => ActivityConstants {
                steps_per_minute: Some(100.0),
                km_per_step: Some(0.0008),
                km_per_minute: None,
                met: 3.5,
                heart_rate_intensity: 0.35,
            },
            ActivityKind::Jogging => ActivityConstants {
                steps_per_minute: Some(150.0),
                km_per_step: Some(0.001),
                km_per_minute: None,
                met: 7.0,
                heart_rate_intensity: 0.6,
            },
            ActivityKind::Cycling => ActivityConstants {
                steps_per_minute: None,
                km_per_step: None,
                km_per_minute: Some(0.3),
                met: 6.8,
                heart_rate_intensity: 0.5,
            },
            ActivityKind::Swimming => ActivityConstants {
                steps_per_minute: None,
                km_per_step: None,
                km_per_minute: None,
                met: 9.8,
                heart_rate_intensity: 0.65,
            },
        }
    }
}

/// Fills in missing activity metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsEstimator {
    settings: EstimatorSettings,
}

impl MetricsEstimator {
    pub fn new(settings: EstimatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EstimatorSettings {
        &self.settings
    }

    /// Complete the metrics for a known activity kind
    pub fn estimate(
        &self,
        kind: ActivityKind,
        profile: &Profile,
        partial: PartialMetrics,
    ) -> CompletedMetrics {
        let profile = profile.with_defaults();
        let constants = ActivityConstants::for_kind(kind);

        let duration = supplied(partial.duration_minutes);
        let mut steps = partial.steps.unwrap_or(0);
        let mut distance = supplied(partial.distance_km);

        if let Some(rate) = constants.steps_per_minute {
            if steps == 0 && duration > 0.0 {
                steps = (duration * rate).round() as u32;
            }
        }

        if distance == 0.0 {
            if let (Some(per_step), true) = (constants.km_per_step, steps > 0) {
                distance = round2(f64::from(steps) * per_step);
            } else if let (Some(per_minute), true) = (constants.km_per_minute, duration > 0.0) {
                distance = round2(duration * per_minute);
            }
        }

        let calories = calories_burned(constants.met, profile.weight, duration);

        let heart_rate = if duration > 0.0 {
            estimate_heart_rate(
                profile.age,
                profile.resting_heart_rate,
                constants.heart_rate_intensity,
                self.jitter(),
            )
        } else {
            profile.resting_heart_rate
        };

        let metrics = CompletedMetrics {
            steps,
            duration_minutes: duration,
            distance_km: distance,
            calories,
            heart_rate,
        };

        debug!(%kind, ?partial, ?metrics, "Estimated metrics");
        metrics
    }

    /// Complete the metrics for an activity given by name
    pub fn estimate_named(
        &self,
        kind: &str,
        profile: &Profile,
        partial: PartialMetrics,
    ) -> Result<CompletedMetrics> {
        let kind = kind.parse::<ActivityKind>().map_err(|e| {
            warn!(kind, "Rejected unknown activity kind");
            e
        })?;
        Ok(self.estimate(kind, profile, partial))
    }

    /// Estimate from duration alone, falling back to the configured default duration
    pub fn estimate_auto(
        &self,
        kind: ActivityKind,
        profile: &Profile,
        duration_minutes: Option<f64>,
    ) -> CompletedMetrics {
        let duration = duration_minutes
            .filter(|d| d.is_finite() && *d > 0.0)
            .unwrap_or(self.settings.auto_duration_minutes);
        self.estimate(kind, profile, PartialMetrics::from_duration(duration))
    }

    /// Estimate and wrap the result in a new entry
    pub fn build_entry(
        &self,
        kind: ActivityKind,
        profile: &Profile,
        partial: PartialMetrics,
        notes: impl Into<String>,
    ) -> Entry {
        Entry::new(kind, self.estimate(kind, profile, partial), notes)
    }

    fn jitter(&self) -> i32 {
        let bpm = self.settings.heart_rate_jitter_bpm.min(MAX_HEART_RATE_JITTER_BPM) as i32;
        if bpm == 0 {
            return 0;
        }
        rand::thread_rng().gen_range(-bpm..=bpm)
    }
}

/// Treat absent, negative and non-finite values as not supplied
fn supplied(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// `round(met × weight × hours)`
pub fn calories_burned(met: f64, weight_kg: f64, duration_minutes: f64) -> u32 {
    (met * weight_kg * (duration_minutes / 60.0)).round() as u32
}

/// Heart-rate-reserve estimate, clamped to `[resting, 190]`.
///
/// A resting rate above 190 is returned unchanged.
pub fn estimate_heart_rate(age: u32, resting: u32, intensity: f64, jitter: i32) -> u32 {
    let max_hr = 220.0 - f64::from(age);
    let rest = f64::from(resting);
    let base = (rest + intensity * (max_hr - rest)).round();
    let upper = f64::from(MAX_ESTIMATED_HEART_RATE).max(rest);
    (base + f64::from(jitter)).clamp(rest, upper) as u32
}
