//! Call stack capture.
//!
//! This module handles:
//! - Snapshotting the live call stack when a query starts
//! - Template frames registered by template engines
//! - Deriving comparable stack keys

pub mod snapshot;
pub mod source;
pub mod template;

// Re-export main types
pub use snapshot::{FrameKey, FrameKind, StackFrame, StackKey, StackSnapshot};
pub use source::{ManualStackSource, NativeStackSource, StackSource};
pub use template::{enter as enter_template, TemplateFrameGuard, TemplateNode};
