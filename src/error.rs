//! Error types for datasweep

use std::path::PathBuf;

use thiserror::Error;

use crate::session::FileId;

/// Errors raised while loading, cleaning, sampling or exporting a single file
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Unsupported file type: {}", display_extension(.0))]
    UnsupportedFormat(String),

    #[error("Failed to parse table: {0}")]
    Parse(String),

    #[error("Failed to encode table: {0}")]
    Encoding(String),

    #[error("Cannot fill missing values in column '{column}': it has no values to average")]
    UndefinedMean { column: String },

    #[error("Need at least two numeric columns to chart, found {found}")]
    InsufficientNumericColumns { found: usize },

    #[error("No uploaded file with id {0}")]
    UnknownFile(FileId),

    #[error("Cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to overwrite input file {}", path.display())]
    OverwritesInput { path: PathBuf },

    #[error("{} was already written for {first}", path.display())]
    DuplicateTarget { path: PathBuf, first: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn display_extension(ext: &str) -> &str {
    if ext.is_empty() {
        "(no extension)"
    } else {
        ext
    }
}

impl From<csv::Error> for SweepError {
    fn from(e: csv::Error) -> Self {
        SweepError::Parse(e.to_string())
    }
}

impl From<calamine::XlsxError> for SweepError {
    fn from(e: calamine::XlsxError) -> Self {
        SweepError::Parse(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for SweepError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        SweepError::Encoding(e.to_string())
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, SweepError>;
