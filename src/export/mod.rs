use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::activity_log::ActivityLog;
use crate::error::{ImportExportError, Result};
use crate::models::{Goals, Profile};

pub mod csv;
pub mod json;

/// Column order shared by the CSV exporter and importer
pub const CSV_COLUMNS: [&str; 8] = [
    "date",
    "activity",
    "steps",
    "duration",
    "distance_km",
    "calories",
    "heartRate",
    "notes",
];

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Flat rows, one per entry
    Csv,
    /// Profile, goals and log in one document
    Json,
}

impl ExportFormat {
    /// Pick a format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ImportExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ImportExportError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Full backup document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub profile: Profile,
    pub goals: Goals,
    pub activity_data: ActivityLog,
}

/// Write the requested format to `path`
pub fn export_to_path<P: AsRef<Path>>(
    format: ExportFormat,
    bundle: &ExportBundle,
    path: P,
) -> Result<()> {
    match format {
        ExportFormat::Csv => csv::export_csv(&bundle.activity_data, path),
        ExportFormat::Json => json::export_bundle(bundle, path),
    }
}
