//! Duplicate Queries
//!
//! Detects redundant database queries within a unit of work (a request,
//! a test): the same SQL executed more than once from the same call stack.
//! Each duplicate is reported with a compressed, readable stack trace so the
//! N+1 loop behind it can be found.
//!
//! ## Getting Started
//!
//! ```ignore
//! use duplicate_queries::{detect_duplicate_queries, Connection, DetectOptions, SqliteBackend};
//!
//! let connection = Connection::new(SqliteBackend::open_in_memory()?);
//! detect_duplicate_queries(&connection, DetectOptions::new(), |detector| {
//!     for id in 1..=3i64 {
//!         connection.execute("SELECT name FROM author WHERE id = ?1", &[id.into()])?;
//!     }
//!     assert!(detector.has_duplicates());
//!     Ok::<_, duplicate_queries::QueryError>(())
//! })?;
//! ```

pub mod capture;
pub mod db;
pub mod detector;
pub mod render;
pub mod session;
pub mod utils;

pub use capture::{enter_template, StackFrame, StackSnapshot, StackSource, TemplateNode};
#[cfg(feature = "sqlite")]
pub use db::SqliteBackend;
pub use db::{Backend, Connection, ExecuteWrapper, QueryCall, QueryOutput, SqlValue};
pub use detector::DuplicateDetector;
pub use render::{DuplicateReport, RenderOptions, StackRenderer};
pub use session::{detect_duplicate_queries, DetectOptions, DuplicateQueryGuard};
pub use utils::error::{DetectionError, QueryError, SessionError};
