use std::io::Write;
use std::path::Path;
use tracing::info;

use super::ExportBundle;
use crate::error::{ImportExportError, Result};

/// Export profile, goals and log as one pretty-printed JSON document
pub fn export_bundle<P: AsRef<Path>>(bundle: &ExportBundle, output_path: P) -> Result<()> {
    let json_data = serde_json::to_string_pretty(bundle).map_err(ImportExportError::from)?;

    let mut file = std::fs::File::create(&output_path)?;
    file.write_all(json_data.as_bytes())?;

    info!(
        path = %output_path.as_ref().display(),
        entries = bundle.activity_data.entry_count(),
        "Exported JSON bundle"
    );
    Ok(())
}
