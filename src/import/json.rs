use std::path::Path;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportBundle, ImportFormat, ImportedData};

/// Reads a backup document written by the JSON exporter
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        JsonImporter
    }

    pub fn parse_bundle(&self, content: &str) -> Result<ImportBundle> {
        let bundle = serde_json::from_str(content).map_err(ImportExportError::from)?;
        Ok(bundle)
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportedData> {
        let content = std::fs::read_to_string(file_path)?;
        Ok(ImportedData::Bundle(self.parse_bundle(&content)?))
    }

    fn get_format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActivityLogError;
    use crate::models::ActivityKind;
    use chrono::NaiveDate;

    #[test]
    fn test_partial_bundle() {
        let bundle = JsonImporter::new()
            .parse_bundle(r#"{"goals":{"steps":8000,"calories":400,"durationMinutes":45}}"#)
            .unwrap();

        assert!(bundle.profile.is_none());
        assert!(bundle.activity_data.is_none());
        assert_eq!(bundle.goals.unwrap().steps, 8000);
    }

    #[test]
    fn test_legacy_bundle() {
        let bundle = JsonImporter::new()
            .parse_bundle(
                r#"{
                    "profile": {"name":"Ana","age":41,"weight":58.5,"restingHR":52},
                    "activityData": {
                        "2025-10-26": {"entries":[{"id":"x","activity":"cycling","duration":40,"distance_km":12,"calories":317,"heartRate":125}]}
                    }
                }"#,
            )
            .unwrap();

        assert_eq!(bundle.profile.unwrap().resting_heart_rate, 52);
        let log = bundle.activity_data.unwrap();
        let day = log.entries_for(NaiveDate::from_ymd_opt(2025, 10, 26).unwrap());
        assert_eq!(day[0].activity_kind, ActivityKind::Cycling);
        assert_eq!(day[0].distance_km, 12.0);
    }

    #[test]
    fn test_invalid_json() {
        let err = JsonImporter::new().parse_bundle("[1, 2").unwrap_err();
        assert!(matches!(
            err,
            ActivityLogError::ImportExport(ImportExportError::Json(_))
        ));
    }
}
