//! Detection sessions.
//!
//! A session scopes one detector to one unit of work. Use the guard, the
//! closure entry point, or the middleware for request handlers.

pub mod controller;
pub mod middleware;
pub mod options;

// Re-export main functions
pub use controller::{detect_duplicate_queries, DuplicateQueryGuard};
pub use middleware::{DetectDuplicateQueriesMiddleware, Handler};
pub use options::DetectOptions;
