use std::path::PathBuf;

use thiserror::Error;

/// Rejected run parameters. Raised before a run is created.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no data file selected")]
    MissingSource,
    #[error("{field} is not a number: '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be >= 1 (got {value})")]
    RowOutOfRange { field: &'static str, value: usize },
    #[error("end row {end} is before start row {start}")]
    InvertedRange { start: usize, end: usize },
    #[error("{field} must be a finite number >= 0 (got {value})")]
    BadDelay { field: &'static str, value: f64 },
}

/// The row source could not be read. Ends the run at loading.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported file type: '{0}' (use .csv, .xlsx or .xls)")]
    Unsupported(String),
    #[error("error reading CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("error reading workbook: {0}")]
    Workbook(String),
    #[error("workbook has no worksheets")]
    NoSheet,
}

/// An injection sequence that does not follow the key grammar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeySeqError {
    #[error("unclosed '{{' at offset {0}")]
    Unclosed(usize),
    #[error("unknown key '{{{0}}}'")]
    UnknownKey(String),
    #[error("bad repeat count in '{{{0}}}'")]
    BadRepeat(String),
    #[error("unmatched '{0}' at offset {1}")]
    Unmatched(char, usize),
}

/// Why a run ended in `Failed`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("error on row {row}: {message}")]
    Row { row: usize, message: String },
    #[error("worker thread panicked: {0}")]
    Worker(String),
}
