use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::activity_log::ActivityLog;
use crate::error::{ImportExportError, Result};
use crate::models::{Entry, Goals, Profile};

pub mod csv;
pub mod json;

/// Backup document as read back in; absent sections are left untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBundle {
    pub profile: Option<Profile>,
    pub goals: Option<Goals>,
    pub activity_data: Option<ActivityLog>,
}

/// How imported entries combine with the existing log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    /// Imported entries become the whole log
    #[default]
    Replace,
    /// Imported entries are added after the existing ones
    Append,
}

/// What an importer produced
#[derive(Debug, Clone, PartialEq)]
pub enum ImportedData {
    /// Flat dated entries with freshly generated ids
    Entries(Vec<(NaiveDate, Entry)>),
    /// A full or partial backup
    Bundle(ImportBundle),
}

impl ImportedData {
    pub fn entry_count(&self) -> usize {
        match self {
            ImportedData::Entries(entries) => entries.len(),
            ImportedData::Bundle(bundle) => bundle
                .activity_data
                .as_ref()
                .map_or(0, ActivityLog::entry_count),
        }
    }
}

/// Trait for importing activity data from different file formats
pub trait ImportFormat {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import activity data from the file
    fn import_file(&self, file_path: &Path) -> Result<ImportedData>;

    /// Get the format name for this importer
    fn get_format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn ImportFormat>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn ImportFormat>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format from its extension
    pub fn import_file(&self, file_path: &Path) -> Result<ImportedData> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportExportError::UnsupportedFormat {
                format: file_path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file_path.display().to_string()),
            })?;

        self.run(importer.as_ref(), file_path)
    }

    /// Import a file with an explicitly named format
    pub fn import_file_as(&self, file_path: &Path, format: &str) -> Result<ImportedData> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.get_format_name().eq_ignore_ascii_case(format))
            .ok_or_else(|| ImportExportError::UnsupportedFormat {
                format: format.to_string(),
            })?;

        self.run(importer.as_ref(), file_path)
    }

    fn run(&self, importer: &dyn ImportFormat, file_path: &Path) -> Result<ImportedData> {
        info!(
            path = %file_path.display(),
            format = importer.get_format_name(),
            "Importing"
        );
        let data = importer.import_file(file_path)?;
        info!(entries = data.entry_count(), "Import finished");
        Ok(data)
    }

    /// Check if any importer handles this file
    pub fn can_import_file(&self, file_path: &Path) -> bool {
        self.importers.iter().any(|importer| importer.can_import(file_path))
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-insensitive extension check shared by the importers
fn has_extension(file_path: &Path, expected: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActivityLogError;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_detects_format_by_extension() {
        let manager = ImportManager::new();
        assert!(manager.can_import_file(Path::new("log.CSV")));
        assert!(manager.can_import_file(Path::new("backup.json")));
        assert!(!manager.can_import_file(Path::new("ride.fit")));
    }

    #[test]
    fn test_unsupported_file() {
        let manager = ImportManager::new();
        let err = manager.import_file(Path::new("ride.fit")).unwrap_err();
        assert!(matches!(
            err,
            ActivityLogError::ImportExport(ImportExportError::UnsupportedFormat { ref format }) if format == "fit"
        ));
    }

    #[test]
    fn test_import_with_explicit_format() {
        let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "date,activity,steps,duration,distance_km,calories,heartRate,notes").unwrap();
        writeln!(file, "2025-10-26,cycling,0,40,12,317,125,commute").unwrap();

        let manager = ImportManager::new();
        assert!(manager.import_file(file.path()).is_err());

        let data = manager.import_file_as(file.path(), "csv").unwrap();
        assert_eq!(data.entry_count(), 1);
    }
}
