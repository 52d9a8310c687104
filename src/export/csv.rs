use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

use super::CSV_COLUMNS;
use crate::activity_log::ActivityLog;
use crate::error::{ImportExportError, Result};

/// Write every entry as one CSV row, dates ascending.
///
/// Fields containing a comma, quote or newline are quoted with embedded
/// quotes doubled. An unknown heart rate (0) is written as an empty cell.
pub fn write_csv<W: Write>(log: &ActivityLog, writer: W) -> Result<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);
    csv_writer
        .write_record(CSV_COLUMNS)
        .map_err(ImportExportError::from)?;

    for (date, entry) in log.iter() {
        let heart_rate = if entry.heart_rate > 0 {
            entry.heart_rate.to_string()
        } else {
            String::new()
        };

        csv_writer
            .write_record([
                date.format("%Y-%m-%d").to_string(),
                entry.activity_kind.to_string(),
                entry.steps.to_string(),
                entry.duration_minutes.to_string(),
                entry.distance_km.to_string(),
                entry.calories.to_string(),
                heart_rate,
                entry.notes.clone(),
            ])
            .map_err(ImportExportError::from)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Render the log as a CSV string
pub fn to_csv_string(log: &ActivityLog) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(log, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| {
        ImportExportError::ExportFailed {
            path: "<memory>".into(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Export the log to a CSV file
pub fn export_csv<P: AsRef<Path>>(log: &ActivityLog, output_path: P) -> Result<()> {
    let file = File::create(&output_path)?;
    write_csv(log, file)?;
    info!(
        path = %output_path.as_ref().display(),
        entries = log.entry_count(),
        "Exported CSV"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityKind, Entry};
    use chrono::NaiveDate;
    use tempfile::NamedTempFile;

    fn create_test_log() -> ActivityLog {
        let mut log = ActivityLog::new();
        log.add_entry(
            NaiveDate::from_ymd_opt(2025, 10, 26).unwrap(),
            Entry {
                id: "a".to_string(),
                activity_kind: ActivityKind::Walking,
                steps: 3000,
                duration_minutes: 30.0,
                distance_km: 2.4,
                calories: 123,
                heart_rate: 106,
                notes: "loop, then \"hill\"".to_string(),
            },
        );
        log.add_entry(
            NaiveDate::from_ymd_opt(2025, 10, 25).unwrap(),
            Entry {
                id: "b".to_string(),
                activity_kind: ActivityKind::Swimming,
                steps: 0,
                duration_minutes: 45.5,
                distance_km: 0.0,
                calories: 520,
                heart_rate: 0,
                notes: String::new(),
            },
        );
        log
    }

    #[test]
    fn test_csv_layout() {
        let csv = to_csv_string(&create_test_log()).unwrap();
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "date,activity,steps,duration,distance_km,calories,heartRate,notes"
        );
        // Dates ascending; unknown heart rate left empty
        assert_eq!(lines[1], "2025-10-25,swimming,0,45.5,0,520,,");
        assert_eq!(
            lines[2],
            "2025-10-26,walking,3000,30,2.4,123,106,\"loop, then \"\"hill\"\"\""
        );
    }

    #[test]
    fn test_export_csv_to_file() {
        let temp_file = NamedTempFile::new().unwrap();
        export_csv(&create_test_log(), temp_file.path()).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.starts_with("date,activity"));
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_empty_log_writes_header_only() {
        let csv = to_csv_string(&ActivityLog::new()).unwrap();
        assert_eq!(csv.trim_end(), CSV_COLUMNS.join(","));
    }
}
