//! Error types shared by the persistence layer and the command bridge.
//!
//! The library layers return these typed errors; the TUI and the binary wrap
//! them in `anyhow` when they need extra context for the status line.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failures raised by the persistence store and its data access helpers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store was never opened or has already been closed.
    #[error("database not initialized")]
    Uninitialized,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A row could not be decoded into the requested model.
    #[error("invalid record: {0}")]
    Record(#[from] serde_json::Error),

    /// The database file exists but its contents are unusable.
    #[error("corrupt database file: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for command bridge operations.
pub type BridgeResult<T> = std::result::Result<T, BridgeError>;

/// Failures surfaced by the command bridge to its callers.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The request payload failed boundary validation.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The file dialog could not be shown or the chosen file could not be read.
    #[error("file dialog failed: {0}")]
    Dialog(String),

    /// The backend answered with a response that does not belong to the command.
    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),
}

impl BridgeError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        BridgeError::Validation(message.into())
    }
}

/// Failures while rendering or saving the monthly PDF report.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A roster CSV line that cannot be imported as written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CsvError {
    #[error("line {line}: birth date \"{value}\" is not a date (use YYYY-MM-DD or DD.MM.YYYY)")]
    BirthDate { line: usize, value: String },
}
