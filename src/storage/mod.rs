// src/storage/mod.rs
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};

use crate::extractors::shipment::Record;
use crate::utils::error::StorageError;

/// Column order of the exported table.
pub const TABLE_HEADER: [&str; 3] = ["delivery_id", "product_service_id", "serial_number"];

/// Creates the parent directory of `path` if it does not exist yet.
fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|e| StorageError::destination(path, e))?;
            tracing::debug!("Created output directory {}", parent.display());
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Writes the records as comma-delimited text with a fixed three-column header.
///
/// Fields are quoted only when they contain a delimiter, quote or newline.
/// An existing file at `destination` is overwritten.
pub fn write_table<P: AsRef<Path>>(records: &[Record], destination: P) -> Result<PathBuf, StorageError> {
    let destination = destination.as_ref();
    ensure_parent_dir(destination)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(destination)
        .map_err(|e| StorageError::destination_csv(destination, e))?;

    // Written explicitly so an empty table still gets its header row.
    writer
        .write_record(TABLE_HEADER)
        .map_err(|e| StorageError::destination_csv(destination, e))?;

    for record in records {
        writer
            .serialize(record)
            .map_err(|e| StorageError::destination_csv(destination, e))?;
    }

    writer
        .flush()
        .map_err(|e| StorageError::destination(destination, e))?;

    tracing::info!("Saved {} records to {}", records.len(), destination.display());
    Ok(destination.to_path_buf())
}

/// `edi_extract_YYYYMMDD_HHMMSS.csv` under the user's documents directory.
pub fn default_output_path(now: DateTime<Local>) -> PathBuf {
    let filename = format!("edi_extract_{}.csv", now.format("%Y%m%d_%H%M%S"));

    let base_dir = dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."));

    base_dir.join(filename)
}

/// Path of the JSON sidecar for a table written to `destination`.
pub fn metadata_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".meta.json");
    destination.with_file_name(name)
}

/// Saves metadata about an export next to the table in JSON format.
pub fn write_metadata(records: &[Record], source: &Path, destination: &Path) -> Result<PathBuf, StorageError> {
    let file_path = metadata_path(destination);
    ensure_parent_dir(&file_path)?;

    let deliveries: HashSet<&str> = records.iter().map(|r| r.delivery_id.as_str()).collect();

    let metadata = serde_json::json!({
        "source": source.display().to_string(),
        "output": destination.display().to_string(),
        "record_count": records.len(),
        "delivery_count": deliveries.len(),
        "columns": TABLE_HEADER,
        "extraction_timestamp": Utc::now().to_rfc3339(),
    });

    let metadata_str = serde_json::to_string_pretty(&metadata)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    fs::write(&file_path, metadata_str).map_err(|e| StorageError::destination(&file_path, e))?;

    tracing::info!("Saved metadata to {}", file_path.display());
    Ok(file_path)
}
