//! Query execution path.
//!
//! This module handles:
//! - The wrapper hook that detectors install themselves through
//! - A connection type that runs every execution through its wrappers
//! - Backends that perform the actual SQL (SQLite behind the `sqlite` feature)

pub mod connection;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod types;

// Re-export main types
pub use connection::{Backend, Connection, ExecuteWrapper, WrapperHandle, WrapperStack};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;
pub use types::{ExecutionContext, QueryCall, QueryOutput, QueryParams, QueryResult, SqlValue};
