//! User-intent commands invoked by a presentation layer.
//!
//! Results are passed around as an explicit [`Extraction`] value; nothing is
//! cached between calls, so a new extraction simply supersedes the old one.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::extractors::shipment::{Record, ShipmentExtractor, StrategyKind};
use crate::storage;
use crate::utils::error::{AppError, ExtractError, StorageError};

/// Records extracted from one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub source: PathBuf,
    pub records: Vec<Record>,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// How extracted records are shown to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewMode {
    /// Aligned table
    #[default]
    Table,
    /// One labelled block per record
    Raw,
    /// Print nothing
    None,
}

pub fn request_extraction<P: AsRef<Path>>(path: P, strategy: StrategyKind) -> Result<Extraction, ExtractError> {
    let source = path.as_ref().to_path_buf();
    let extractor = ShipmentExtractor::with_strategy(strategy);

    tracing::info!("Extracting data from {} ({} strategy)", source.display(), extractor.strategy_name());
    let records = extractor.extract_from_source(&source)?;
    tracing::info!("Extracted {} records from {}", records.len(), source.display());

    Ok(Extraction { source, records })
}

/// Saves a non-empty extraction as a table at `destination`.
pub fn request_save<P: AsRef<Path>>(extraction: &Extraction, destination: P) -> Result<PathBuf, StorageError> {
    if extraction.is_empty() {
        return Err(StorageError::NothingToSave);
    }
    storage::write_table(&extraction.records, destination)
}

pub fn render_table(records: &[Record]) -> String {
    const HEADINGS: [&str; 3] = ["Delivery ID", "Product Service ID", "Serial Number"];

    let rows: Vec<[&str; 3]> = records
        .iter()
        .map(|r| [r.delivery_id.as_str(), r.product_service_id.as_str(), r.serial_number.as_str()])
        .collect();

    let mut widths = HEADINGS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 3]| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut output = format_row(HEADINGS);
    output.push_str(&format!(
        "{}\n",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    ));
    for row in rows {
        output.push_str(&format_row(row));
    }
    output
}

pub fn render_raw(records: &[Record]) -> String {
    let mut output = String::new();
    for record in records {
        output.push_str(&format!("Delivery ID: {}\n", record.delivery_id));
        output.push_str(&format!("Product Service ID: {}\n", record.product_service_id));
        output.push_str(&format!("Serial Number: {}\n\n", record.serial_number));
    }
    output
}

pub fn render(records: &[Record], mode: ViewMode) -> Option<String> {
    match mode {
        ViewMode::Table => Some(render_table(records)),
        ViewMode::Raw => Some(render_raw(records)),
        ViewMode::None => None,
    }
}

fn viewer_command(path: &Path) -> Command {
    if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", ""]).arg(path);
        cmd
    } else if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(path);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(path);
        cmd
    }
}

/// Opens `path` with the platform's default application.
pub fn open_with_default_viewer(path: &Path) -> Result<(), AppError> {
    let mut cmd = viewer_command(path);
    tracing::debug!("Launching viewer: {:?}", cmd);

    let status = cmd
        .status()
        .map_err(|e| AppError::Viewer(format!("{}: {}", path.display(), e)))?;

    if !status.success() {
        return Err(AppError::Viewer(format!("{}: viewer exited with {}", path.display(), status)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    const DOC: &str = "<ShipConfirmLine><delivery_id>D9</delivery_id><ProductServiceId>P9</ProductServiceId><ShipConfirmSerials><serial_number>SN1</serial_number></ShipConfirmSerials><ShipConfirmSerials><serial_number>SN2</serial_number></ShipConfirmSerials></ShipConfirmLine>";

    #[test]
    fn test_extract_then_save() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.xml");
        fs::write(&input, DOC).unwrap();

        let extraction = request_extraction(&input, StrategyKind::Pattern).unwrap();
        assert_eq!(extraction.source, input);
        assert_eq!(extraction.records.len(), 2);

        let output = dir.path().join("out").join("table.csv");
        let saved = request_save(&extraction, &output).unwrap();
        assert_eq!(saved, output);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "delivery_id,product_service_id,serial_number\nD9,P9,SN1\nD9,P9,SN2\n"
        );
    }

    #[test]
    fn test_new_extraction_supersedes_previous() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.xml");
        let second = dir.path().join("second.xml");
        fs::write(&first, DOC).unwrap();
        fs::write(&second, "<ShipConfirmLine><delivery_id>D1</delivery_id></ShipConfirmLine>").unwrap();

        let a = request_extraction(&first, StrategyKind::Pattern).unwrap();
        let b = request_extraction(&second, StrategyKind::Tree).unwrap();
        assert_eq!(a.records.len(), 2);
        assert_eq!(b.records, vec![Record::new("D1", "", "")]);
    }

    #[test]
    fn test_save_refuses_empty_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let extraction = Extraction {
            source: dir.path().join("in.xml"),
            records: Vec::new(),
        };
        let output = dir.path().join("out.csv");

        assert!(matches!(request_save(&extraction, &output), Err(StorageError::NothingToSave)));
        assert!(!output.exists());
    }

    #[test]
    fn test_extraction_of_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = request_extraction(dir.path().join("nope.xml"), StrategyKind::Pattern);
        assert!(matches!(result, Err(ExtractError::SourceRead { .. })));
    }

    #[test]
    fn test_render_table() {
        let records = vec![Record::new("D1", "PRODUCT-1", "S1"), Record::new("D22", "P2", "")];
        assert_eq!(
            render_table(&records),
            "Delivery ID  Product Service ID  Serial Number\n\
             -----------  ------------------  -------------\n\
             D1           PRODUCT-1           S1\n\
             D22          P2\n"
        );
    }

    #[test]
    fn test_render_raw() {
        let records = vec![Record::new("D1", "P1", "S1")];
        assert_eq!(
            render_raw(&records),
            "Delivery ID: D1\nProduct Service ID: P1\nSerial Number: S1\n\n"
        );
        assert_eq!(render(&records, ViewMode::None), None);
    }
}
