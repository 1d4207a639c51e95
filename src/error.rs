//! Error types for the tally engine.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while loading inputs or computing balances.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Failed to open or read an input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Row rejected at the ingestion boundary
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Input that would corrupt the tally if it reached the allocator
    #[error("Validation error for {subject}: {message}")]
    Validation { subject: String, message: String },

    /// Missing positional argument
    #[error(
        "Missing input file argument. Usage: family-tally <roster.csv> <expenses.csv> [--session NAME] [--epsilon AMOUNT] [--exclude-settlements]"
    )]
    MissingArgument,

    /// Unknown flag or unparsable flag value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    pub(crate) fn validation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            subject: subject.into(),
            message: message.into(),
        }
    }
}
