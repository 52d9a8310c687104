use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ActivityLogError;

/// Activity kinds the estimator knows how to complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Walking,
    Jogging,
    Cycling,
    Swimming,
}

impl ActivityKind {
    /// Every kind, in the order charts stack them
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Walking,
        ActivityKind::Jogging,
        ActivityKind::Cycling,
        ActivityKind::Swimming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Walking => "walking",
            ActivityKind::Jogging => "jogging",
            ActivityKind::Cycling => "cycling",
            ActivityKind::Swimming => "swimming",
        }
    }

    /// Capitalized name for legends and tables
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::Walking => "Walking",
            ActivityKind::Jogging => "Jogging",
            ActivityKind::Cycling => "Cycling",
            ActivityKind::Swimming => "Swimming",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ActivityLogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "walking" => Ok(ActivityKind::Walking),
            "jogging" => Ok(ActivityKind::Jogging),
            "cycling" => Ok(ActivityKind::Cycling),
            "swimming" => Ok(ActivityKind::Swimming),
            _ => Err(ActivityLogError::InvalidActivityKind(s.to_string())),
        }
    }
}

/// User profile used by the estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,

    /// Age in years
    pub age: u32,

    /// Weight in kilograms
    pub weight: f64,

    /// Resting heart rate in beats per minute
    #[serde(alias = "restingHR")]
    pub resting_heart_rate: u32,
}

impl Profile {
    pub const DEFAULT_AGE: u32 = 30;
    pub const DEFAULT_WEIGHT: f64 = 70.0;
    pub const DEFAULT_RESTING_HEART_RATE: u32 = 60;

    /// Reject values the estimator cannot use
    pub fn validate(&self) -> Result<(), ActivityLogError> {
        if self.age == 0 {
            return Err(ActivityLogError::Validation("age must be positive".to_string()));
        }
        if !(self.weight.is_finite() && self.weight > 0.0) {
            return Err(ActivityLogError::Validation(format!(
                "weight must be a positive number of kilograms, got {}",
                self.weight
            )));
        }
        if self.resting_heart_rate == 0 {
            return Err(ActivityLogError::Validation(
                "resting heart rate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Snapshot with zero or invalid fields replaced by the defaults
    pub fn with_defaults(&self) -> Profile {
        Profile {
            name: if self.name.trim().is_empty() {
                "User".to_string()
            } else {
                self.name.clone()
            },
            age: if self.age == 0 { Self::DEFAULT_AGE } else { self.age },
            weight: if self.weight.is_finite() && self.weight > 0.0 {
                self.weight
            } else {
                Self::DEFAULT_WEIGHT
            },
            resting_heart_rate: if self.resting_heart_rate == 0 {
                Self::DEFAULT_RESTING_HEART_RATE
            } else {
                self.resting_heart_rate
            },
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            name: "User".to_string(),
            age: Self::DEFAULT_AGE,
            weight: Self::DEFAULT_WEIGHT,
            resting_heart_rate: Self::DEFAULT_RESTING_HEART_RATE,
        }
    }
}

/// Daily targets shown next to the aggregates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goals {
    pub steps: u32,
    pub calories: u32,
    #[serde(alias = "duration")]
    pub duration_minutes: f64,
}

impl Goals {
    pub fn validate(&self) -> Result<(), ActivityLogError> {
        if !(self.duration_minutes.is_finite() && self.duration_minutes >= 0.0) {
            return Err(ActivityLogError::Validation(format!(
                "duration goal must be zero or more minutes, got {}",
                self.duration_minutes
            )));
        }
        Ok(())
    }
}

impl Default for Goals {
    fn default() -> Self {
        Goals {
            steps: 10_000,
            calories: 500,
            duration_minutes: 30.0,
        }
    }
}

/// Whatever the user typed in; absent and zero mean "not supplied"
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialMetrics {
    pub steps: Option<u32>,
    pub duration_minutes: Option<f64>,
    pub distance_km: Option<f64>,
}

impl PartialMetrics {
    pub fn from_duration(duration_minutes: f64) -> Self {
        PartialMetrics {
            duration_minutes: Some(duration_minutes),
            ..Default::default()
        }
    }
}

/// Estimator output: every quantity filled in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedMetrics {
    pub steps: u32,
    pub duration_minutes: f64,
    pub distance_km: f64,
    pub calories: u32,
    pub heart_rate: u32,
}

/// One logged activity occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default = "new_entry_id")]
    pub id: String,

    #[serde(alias = "activity")]
    pub activity_kind: ActivityKind,

    #[serde(default)]
    pub steps: u32,

    #[serde(default, alias = "duration")]
    pub duration_minutes: f64,

    #[serde(default, alias = "distance_km")]
    pub distance_km: f64,

    #[serde(default)]
    pub calories: u32,

    /// Beats per minute; 0 only when unknown
    #[serde(default)]
    pub heart_rate: u32,

    #[serde(default)]
    pub notes: String,
}

impl Entry {
    /// Build an entry from completed metrics with a fresh id
    pub fn new(kind: ActivityKind, metrics: CompletedMetrics, notes: impl Into<String>) -> Self {
        Entry {
            id: new_entry_id(),
            activity_kind: kind,
            steps: metrics.steps,
            duration_minutes: metrics.duration_minutes,
            distance_km: metrics.distance_km,
            calories: metrics.calories,
            heart_rate: metrics.heart_rate,
            notes: notes.into(),
        }
    }

    /// Field-wise equality ignoring the id
    pub fn same_activity(&self, other: &Entry) -> bool {
        self.activity_kind == other.activity_kind
            && self.steps == other.steps
            && self.duration_minutes == other.duration_minutes
            && self.distance_km == other.distance_km
            && self.calories == other.calories
            && self.heart_rate == other.heart_rate
            && self.notes == other.notes
    }
}

/// Generate a fresh opaque entry id
pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Per-day totals, always derived from the day's entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    pub steps: u64,
    pub duration_minutes: f64,
    pub calories: u64,
    pub distance_km: f64,
    /// Duration-weighted mean heart rate, 0 when no entry qualifies
    pub average_heart_rate: u32,
}

impl DailyAggregate {
    pub fn is_zero(&self) -> bool {
        *self == DailyAggregate::default()
    }
}

/// Achievement unlocked by a threshold over the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub title: String,
    pub description: String,
}

/// Round to two decimal places, half away from zero.
///
/// Goes through `Decimal` so ties round on their decimal digits instead of
/// the binary approximation of `value * 100`.
pub fn round2(value: f64) -> f64 {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or_else(|| (value * 100.0).round() / 100.0)
}
