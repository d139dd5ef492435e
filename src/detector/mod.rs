//! Duplicate query detection.
//!
//! This module turns a stream of query executions into:
//! - A first-seen registry of (call stack, SQL) identities
//! - Repeat counts for identities executed more than once

pub mod engine;
pub mod registry;

// Re-export main types
pub use engine::DuplicateDetector;
pub use registry::{DuplicateRegistry, Observation, QueryIdentity, RegistryEntry};
