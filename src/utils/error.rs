// src/utils/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Failures while obtaining the document text. Missing or malformed tags are
/// never an error; they degrade to empty fields.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Cannot process file {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot write to {}: {source}", .path.display())]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("No data to save, extract data first")]
    NothingToSave,
}

impl StorageError {
    pub(crate) fn destination(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::DestinationWrite {
            path: path.into(),
            source,
        }
    }

    /// Keeps the underlying io error when the csv writer failed on I/O.
    pub(crate) fn destination_csv(path: impl Into<PathBuf>, err: csv::Error) -> Self {
        let source = if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => io,
                other => std::io::Error::new(std::io::ErrorKind::Other, format!("{other:?}")),
            }
        } else {
            std::io::Error::new(std::io::ErrorKind::Other, err)
        };
        Self::destination(path, source)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to open file: {0}")]
    Viewer(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_source_read_message_names_path() {
        let err = ExtractError::SourceRead {
            path: PathBuf::from("in/shipment.xml"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("in/shipment.xml"), "{msg}");
        assert!(msg.contains("no such file"), "{msg}");
    }

    #[test]
    fn test_csv_io_error_keeps_kind() {
        let csv_err = csv::Error::from(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = StorageError::destination_csv("out.csv", csv_err);
        match err {
            StorageError::DestinationWrite { path, source } => {
                assert_eq!(path, PathBuf::from("out.csv"));
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_app_error_wraps_storage() {
        let app: AppError = StorageError::NothingToSave.into();
        assert!(app.to_string().starts_with("Storage error:"));
    }
}
