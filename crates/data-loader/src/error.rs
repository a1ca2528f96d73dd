//! Error types for the data-loader crate.
//!
//! Every variant except `FileNotFound` and `IoError` describes malformed
//! input: a source table that is missing a required field or carries a
//! value that cannot be interpreted.

use thiserror::Error;

/// Errors that can occur while loading the catalog and rating tables
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The CSV reader rejected a record (bad quoting, wrong field count, ...)
    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    /// Line in data file couldn't be parsed
    ///
    /// This variant stores context about where the error occurred
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A required column was empty or absent
    #[error("Missing required field {field} at line {line} in {file}")]
    MissingField {
        file: String,
        line: usize,
        field: &'static str,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., rating for non-existent movie)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u32 },

    /// The file extension doesn't map to a known table format
    #[error("Unsupported table format: {path}")]
    UnsupportedFormat { path: String },
}

impl DataLoadError {
    /// True for the errors caused by the content of a table rather than
    /// by the file system.
    pub fn is_malformed_input(&self) -> bool {
        !matches!(
            self,
            DataLoadError::FileNotFound { .. }
                | DataLoadError::IoError(_)
                | DataLoadError::UnsupportedFormat { .. }
        )
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataLoadError>;
