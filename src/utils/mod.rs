//! Utility modules for configuration, error handling, and colour output.

pub mod color;
pub mod config;
pub mod error;

// Re-export commonly used error types for convenience
pub use error::{DetectionError, OutputError, QueryError, SessionError};
