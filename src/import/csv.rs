use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::error::{ImportExportError, Result};
use crate::import::{has_extension, ImportFormat, ImportedData};
use crate::models::{new_entry_id, ActivityKind, Entry};

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(&mut column_mapping, "date", &["date", "day"]);
        Self::add_mapping(
            &mut column_mapping,
            "activity",
            &["activity", "activitykind", "activity_kind", "kind", "type"],
        );
        Self::add_mapping(&mut column_mapping, "steps", &["steps", "step_count"]);
        Self::add_mapping(
            &mut column_mapping,
            "duration",
            &[
                "duration",
                "duration_min",
                "duration_minutes",
                "durationminutes",
                "minutes",
            ],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance_km",
            &["distance_km", "distancekm", "distance"],
        );
        Self::add_mapping(&mut column_mapping, "calories", &["calories", "kcal"]);
        Self::add_mapping(
            &mut column_mapping,
            "heart_rate",
            &["heart_rate", "heartrate", "hr", "bpm"],
        );
        Self::add_mapping(&mut column_mapping, "notes", &["notes", "note", "comment"]);

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Parse CSV rows from any reader into dated entries with fresh ids
    pub fn read_csv<R: Read>(&self, reader: R) -> Result<Vec<(NaiveDate, Entry)>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers = reader.headers().map_err(ImportExportError::from)?.clone();

        // Standard column name -> index; first occurrence wins
        let mut columns: HashMap<String, usize> = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            columns.entry(self.normalize_column_name(header)).or_insert(i);
        }

        let mut entries = Vec::new();
        for result in reader.records() {
            let record = result.map_err(ImportExportError::from)?;
            if record.iter().all(|value| value.trim().is_empty()) {
                continue;
            }
            let line = record.position().map_or(0, |p| p.line());
            let row = Row {
                record: &record,
                columns: &columns,
                line,
            };
            entries.push(row.parse()?);
        }

        debug!(rows = entries.len(), "Parsed CSV rows");
        Ok(entries)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

/// One data row with its header lookup
struct Row<'a> {
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
    line: u64,
}

impl Row<'_> {
    fn value(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn malformed(&self, field: &str, reason: impl Into<String>) -> ImportExportError {
        ImportExportError::MalformedImportRecord {
            line: self.line,
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn required(&self, column: &str) -> std::result::Result<&str, ImportExportError> {
        self.value(column)
            .ok_or_else(|| self.malformed(column, "missing value"))
    }

    /// Non-negative float; empty cells read as 0
    fn float(&self, column: &str) -> std::result::Result<f64, ImportExportError> {
        match self.value(column) {
            None => Ok(0.0),
            Some(raw) => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or_else(|| self.malformed(column, format!("'{}' is not a number", raw))),
        }
    }

    /// Non-negative whole count; "3000.0" is accepted and rounded
    fn count(&self, column: &str) -> std::result::Result<u32, ImportExportError> {
        match self.value(column) {
            None => Ok(0),
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .or_else(|| {
                    raw.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64)
                        .map(|v| v.round() as u32)
                })
                .ok_or_else(|| self.malformed(column, format!("'{}' is not a count", raw))),
        }
    }

    fn parse(&self) -> Result<(NaiveDate, Entry)> {
        let raw_date = self.required("date")?;
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d")
            .map_err(|e| self.malformed("date", e.to_string()))?;

        let raw_kind = self.required("activity")?;
        let activity_kind = raw_kind
            .parse::<ActivityKind>()
            .map_err(|_| self.malformed("activity", format!("unknown activity '{}'", raw_kind)))?;

        let entry = Entry {
            id: new_entry_id(),
            activity_kind,
            steps: self.count("steps")?,
            duration_minutes: self.float("duration")?,
            distance_km: self.float("distance_km")?,
            calories: self.count("calories")?,
            heart_rate: self.count("heart_rate")?,
            notes: self
                .columns
                .get("notes")
                .and_then(|&i| self.record.get(i))
                .unwrap_or_default()
                .to_string(),
        };

        Ok((date, entry))
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<ImportedData> {
        let file = std::fs::File::open(file_path)?;
        let entries = self.read_csv(file)?;
        Ok(ImportedData::Entries(entries))
    }

    fn get_format_name(&self) -> &'static str {
        "CSV"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActivityLogError;

    fn parse(content: &str) -> Result<Vec<(NaiveDate, Entry)>> {
        CsvImporter::new().read_csv(content.as_bytes())
    }

    fn malformed_field(err: ActivityLogError) -> (u64, String) {
        match err {
            ActivityLogError::ImportExport(ImportExportError::MalformedImportRecord {
                line,
                field,
                ..
            }) => (line, field),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_column_normalization() {
        let importer = CsvImporter::new();
        assert_eq!(importer.normalize_column_name("heartRate"), "heart_rate");
        assert_eq!(importer.normalize_column_name("Duration Min"), "duration");
        assert_eq!(importer.normalize_column_name("activityKind"), "activity");
        assert_eq!(importer.normalize_column_name("mood"), "mood");
    }

    #[test]
    fn test_reads_exported_layout() {
        let rows = parse(
            "date,activity,steps,duration,distance_km,calories,heartRate,notes\n\
             2025-10-26,walking,3000,30,2.4,123,106,\"loop, then \"\"hill\"\"\"\n\
             2025-10-25,swimming,0,45.5,0,520,,\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        let (date, walk) = &rows[0];
        assert_eq!(*date, NaiveDate::from_ymd_opt(2025, 10, 26).unwrap());
        assert_eq!(walk.activity_kind, ActivityKind::Walking);
        assert_eq!(walk.distance_km, 2.4);
        assert_eq!(walk.heart_rate, 106);
        assert_eq!(walk.notes, "loop, then \"hill\"");

        let (_, swim) = &rows[1];
        assert_eq!(swim.duration_minutes, 45.5);
        assert_eq!(swim.heart_rate, 0);
        assert_eq!(swim.notes, "");
    }

    #[test]
    fn test_header_aliases_and_order() {
        let rows = parse(
            "activityKind,date,duration_min,heart_rate\n\
             Jogging,2025-10-26,25,138\n",
        )
        .unwrap();

        let (_, entry) = &rows[0];
        assert_eq!(entry.activity_kind, ActivityKind::Jogging);
        assert_eq!(entry.duration_minutes, 25.0);
        assert_eq!(entry.heart_rate, 138);
        assert_eq!(entry.steps, 0);
    }

    #[test]
    fn test_ids_are_regenerated() {
        let rows = parse("date,activity\n2025-10-26,walking\n2025-10-26,walking\n").unwrap();
        assert_ne!(rows[0].1.id, rows[1].1.id);
        assert!(!rows[0].1.id.is_empty());
    }

    #[test]
    fn test_missing_date_reports_line() {
        let err = parse("date,activity\n2025-10-26,walking\n,cycling\n").unwrap_err();
        assert_eq!(malformed_field(err), (3, "date".to_string()));
    }

    #[test]
    fn test_bad_activity() {
        let err = parse("date,activity\n2025-10-26,rowing\n").unwrap_err();
        assert_eq!(malformed_field(err), (2, "activity".to_string()));
    }

    #[test]
    fn test_missing_activity_column() {
        let err = parse("date,steps\n2025-10-26,100\n").unwrap_err();
        assert_eq!(malformed_field(err).1, "activity");
    }

    #[test]
    fn test_bad_number() {
        let err = parse("date,activity,steps\n2025-10-26,walking,lots\n").unwrap_err();
        assert_eq!(malformed_field(err), (2, "steps".to_string()));
    }

    #[test]
    fn test_fractional_counts_round() {
        let rows = parse("date,activity,steps,calories\n2025-10-26,walking,3000.0,122.6\n").unwrap();
        assert_eq!(rows[0].1.steps, 3000);
        assert_eq!(rows[0].1.calories, 123);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let rows = parse("date,activity\n2025-10-26,walking\n,\n").unwrap();
        assert_eq!(rows.len(), 1);
    }
}
