//! Rendering of stacks and duplicate reports.
//!
//! This module handles:
//! - Compressing and formatting captured stacks
//! - The text report printed at the end of a unit of work
//! - The serializable report structure

pub mod report;
pub mod stack_renderer;

// Re-export main types
pub use report::{DuplicateEntry, DuplicateReport, DETECTED_BANNER};
pub use stack_renderer::{RenderOptions, StackRenderer};
