//! Storage error types
//!
//! Errors raised while reading, migrating or writing the case file. They are
//! translated to `PortError` at the port boundary.

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur during file storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid delimited text
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A row could not be turned into a case
    #[error("Malformed row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    /// The case is not in the file
    #[error("Case not found: {0}")]
    NotFound(String),

    /// The write was based on a stale revision or a stale view of the file
    #[error("Revision conflict: {0}")]
    Conflict(String),

    /// Rendering the in-memory buffer failed
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Creates a malformed row error; `row` is the 1-based line number
    pub fn malformed(row: usize, message: impl Into<String>) -> Self {
        StoreError::MalformedRow {
            row,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Checks if this error comes from the file system rather than the data
    pub fn is_io(&self) -> bool {
        match self {
            StoreError::Io(_) => true,
            StoreError::Csv(e) => e.is_io_error(),
            _ => false,
        }
    }
}

impl From<StoreError> for PortError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => PortError::not_found("Case", id),
            StoreError::Conflict(message) => PortError::Conflict { message },
            e if e.is_io() => PortError::Connection {
                message: format!("case file unavailable: {}", e),
                source: Some(Box::new(e)),
            },
            e => PortError::internal_with_source("case file is corrupt", e),
        }
    }
}
