use std::path::PathBuf;

use thiserror::Error;

/// Reasons a dataset could not be loaded. Any of these stops the run
/// before a single aggregate is computed.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("dataset is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}, column {column}: {reason}")]
    InvalidValue {
        /// 1-based. For CSV this is the file line, with the header on line 1;
        /// for JSON and Parquet it is the record's position.
        row: usize,
        column: &'static str,
        reason: String,
    },
}

/// Malformed filter input coming from the front end.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("date range needs one or two dates, got {0}")]
    MalformedDateRange(usize),

    #[error("unknown filter dimension '{0}'")]
    UnknownDimension(String),
}
