//! Error types for the entire library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` at the application edge (middleware handlers).

use thiserror::Error;

/// Raised when a strict session ends with duplicates on record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("Duplicate queries detected: {queries} duplicated queries ({executions} executions)")]
    DuplicatesDetected { queries: usize, executions: u64 },
}

/// Errors that can occur while a backend executes a query
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection is busy with another query")]
    Busy,

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Outcome of a scoped detection session that ran a fallible body
///
/// The body's own error always wins over escalation: the report is printed
/// either way, but a failing unit of work reports its own failure.
#[derive(Error, Debug)]
pub enum SessionError<E> {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("{0}")]
    Body(E),
}

impl<E> SessionError<E> {
    /// Returns the body error, if that is what ended the session
    pub fn into_body(self) -> Option<E> {
        match self {
            SessionError::Body(e) => Some(e),
            SessionError::Detection(_) => None,
        }
    }

    /// True if the session failed because duplicates were found
    pub fn is_detection(&self) -> bool {
        matches!(self, SessionError::Detection(_))
    }
}

/// Errors that can occur while writing a report
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write report: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
