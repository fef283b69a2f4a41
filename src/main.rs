// src/main.rs
use std::path::PathBuf;

use clap::Parser;
use edi_extractor::commands::{self, ViewMode};
use edi_extractor::extractors::StrategyKind;
use edi_extractor::storage;
use edi_extractor::utils::{self, AppError};

/// Command Line Interface for the EDI shipment extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// EDI file to extract from (text/XML)
    #[arg(short, long)]
    input: PathBuf,

    /// Output CSV file (default: ~/Documents/edi_extract_<timestamp>.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction strategy
    #[arg(short, long, value_enum, default_value_t = StrategyKind::Pattern)]
    strategy: StrategyKind,

    /// How to show the extracted records on stdout
    #[arg(long, value_enum, default_value_t = ViewMode::Table)]
    view: ViewMode,

    /// Only show the records, do not write a CSV file
    #[arg(long)]
    no_save: bool,

    /// Also write a JSON metadata file next to the CSV
    #[arg(long)]
    metadata: bool,

    /// Open the saved CSV with the default application
    #[arg(long)]
    open: bool,

    /// Debug mode - save an annotated HTML copy of the input showing matched tags
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| storage::default_output_path(chrono::Local::now()))
    }
}

fn debug_html_path(output: &std::path::Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "edi_extract".to_string());
    output.with_file_name(format!("{}_annotated.html", stem))
}

fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::debug!("Starting processing for args: {:?}", args);

    if args.no_save && (args.open || args.metadata) {
        return Err(AppError::Config("--open and --metadata need a saved file, drop --no-save".to_string()));
    }

    // 3. Extract
    let extraction = commands::request_extraction(&args.input, args.strategy)?;
    let output = args.output_path();

    if args.debug {
        let content = std::fs::read_to_string(&args.input)?;
        let debug_path = debug_html_path(&output);
        if let Err(e) = utils::match_debug::create_debug_html(&content, &debug_path) {
            tracing::warn!("Failed to create debug HTML: {}", e);
        }
    }

    if extraction.is_empty() {
        tracing::info!("No data found in the selected file.");
        return Ok(());
    }

    // 4. Render
    if let Some(view) = commands::render(&extraction.records, args.view) {
        print!("{}", view);
    }

    if args.no_save {
        return Ok(());
    }

    // 5. Save
    let saved = commands::request_save(&extraction, &output)?;
    tracing::info!("Data saved to {}", saved.display());

    if args.metadata {
        if let Err(e) = storage::write_metadata(&extraction.records, &extraction.source, &saved) {
            tracing::error!("Failed to save metadata: {}", e);
        }
    }

    // 6. Optionally open the result
    if args.open {
        commands::open_with_default_viewer(&saved)?;
    }

    Ok(())
}
