// Library interface for activelog modules
// This allows integration tests to access the core functionality

pub mod activity_log;
pub mod aggregate;
pub mod badges;
pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod import;
pub mod logging;
pub mod models;
pub mod sample;
pub mod store;
pub mod tracker;

// Re-export commonly used types for convenience
pub use activity_log::ActivityLog;
pub use aggregate::{
    aggregate_day, aggregate_range, compute_streak, current_streak, month_view, summarize,
    DateRange, GoalProgress, MonthView, RangeAggregate,
};
pub use badges::{compute_badges, compute_badges_with};
pub use config::AppConfig;
pub use error::{ActivityLogError, ErrorSeverity, ImportExportError, Result, StorageError};
pub use estimator::MetricsEstimator;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use store::{AppState, FileStore, KeyValueStore, MemoryStore};
pub use tracker::{ImportSummary, Tracker};
