// src/lib.rs
//! Extracts shipment records (delivery id, product/service id, serial number)
//! from tag-delimited EDI text and exports them as a comma-delimited table.

pub mod commands;
pub mod extractors;
pub mod storage;
pub mod utils;

pub use extractors::shipment::{extract_data, extract_from_source, Record};
pub use storage::write_table;
pub use utils::error::{AppError, ExtractError, StorageError};
