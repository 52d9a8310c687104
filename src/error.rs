//! Unified error hierarchy for activelog
//!
//! Library operations return [`ActivityLogError`]; the binary and the config
//! layer wrap these in `anyhow` with added context.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all activelog operations
#[derive(Debug, Error)]
pub enum ActivityLogError {
    /// Activity kind outside walking/jogging/cycling/swimming
    #[error("Invalid activity kind: {0}")]
    InvalidActivityKind(String),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Persistence errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// No importer or exporter handles this format
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// A row is missing a required field or carries an unparseable value
    #[error("Malformed import record at line {line}: {field} ({reason})")]
    MalformedImportRecord {
        line: u64,
        field: String,
        reason: String,
    },

    /// CSV reader/writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Export could not be written
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },
}

/// Persistence errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// No entry with this id on this date
    #[error("Entry not found: {date}/{id}")]
    EntryNotFound { date: NaiveDate, id: String },

    /// Stored value could not be decoded
    #[error("Corrupted value for key {key}: {reason}")]
    Corrupted { key: String, reason: String },

    /// Stored value could not be encoded
    #[error("Failed to encode value for key {key}: {reason}")]
    Encode { key: String, reason: String },
}

/// Result type alias for activelog operations
pub type Result<T> = std::result::Result<T, ActivityLogError>;

impl ActivityLogError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ActivityLogError::InvalidActivityKind(_) => ErrorSeverity::Warning,
            ActivityLogError::Validation(_) => ErrorSeverity::Warning,
            ActivityLogError::Storage(StorageError::EntryNotFound { .. }) => ErrorSeverity::Warning,
            ActivityLogError::ImportExport(ImportExportError::MalformedImportRecord { .. }) => {
                ErrorSeverity::Warning
            }
            ActivityLogError::Storage(StorageError::Corrupted { .. }) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ActivityLogError::InvalidActivityKind(kind) => format!(
                "'{}' is not a supported activity. Choose walking, jogging, cycling or swimming.",
                kind
            ),
            ActivityLogError::ImportExport(ImportExportError::MalformedImportRecord {
                line,
                field,
                ..
            }) => format!("Import file has a bad '{}' value on line {}", field, line),
            ActivityLogError::Storage(StorageError::EntryNotFound { date, .. }) => {
                format!("No such activity on {}", date)
            }
            ActivityLogError::Storage(StorageError::Corrupted { key, .. }) => format!(
                "Stored {} data is unreadable. Reset it or restore from an export.",
                key
            ),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Stored state can no longer be trusted
    Critical,
    /// Operation failed but the process can continue
    Error,
    /// Caller input was rejected
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
