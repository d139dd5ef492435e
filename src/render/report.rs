//! Duplicate query report.
//!
//! Built from the registry at the end of a unit of work. Written as text for
//! humans; serializable for anything that wants to post-process it.

use super::stack_renderer::StackRenderer;
use crate::detector::DuplicateRegistry;
use crate::utils::color::highlight;
use crate::utils::config::{FRAME_INDENT, SCHEMA_VERSION};
use crate::utils::error::OutputError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const DETECTED_BANNER: &str = "Duplicate queries detected!";

/// One duplicated (call stack, SQL) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateEntry {
    pub sql: String,

    /// Total executions, the first one included
    pub executions: u64,

    /// Rendered call stack
    pub stack: String,
}

/// Everything duplicated during one unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Schema version for compatibility checking
    pub version: String,

    /// Duplicates in the order their first execution happened
    pub entries: Vec<DuplicateEntry>,

    /// Number of duplicated queries
    pub total_duplicates: usize,

    /// Executions across all duplicated queries
    pub total_executions: u64,
}

impl DuplicateReport {
    /// Build the report from a registry
    ///
    /// **Public** - used by the detector
    pub fn build(registry: &DuplicateRegistry, renderer: &StackRenderer) -> Self {
        let entries: Vec<DuplicateEntry> = registry
            .duplicates()
            .map(|(entry, repeats)| DuplicateEntry {
                sql: entry.sql().to_string(),
                executions: repeats + 1,
                stack: renderer.render(entry.snapshot()),
            })
            .collect();

        debug!("Built duplicate report with {} entries", entries.len());

        Self {
            version: SCHEMA_VERSION.to_string(),
            total_duplicates: entries.len(),
            total_executions: entries.iter().map(|entry| entry.executions).sum(),
            entries,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text form of the report; empty when there is nothing to report
    pub fn to_text(&self, color: bool) -> String {
        if self.is_empty() {
            return String::new();
        }

        let mut out = String::new();
        out.push('\n');
        out.push_str(&highlight(DETECTED_BANNER, color));
        out.push('\n');

        for entry in &self.entries {
            out.push_str(&entry.stack);
            out.push_str(&format!("{}SQL: {}\n", FRAME_INDENT, entry.sql));
            out.push('\n');
            out.push_str(&highlight(
                &format!("^^ The above query was executed {} times ^^", entry.executions),
                color,
            ));
            out.push_str("\n\n");
        }

        out.push_str(&highlight(&self.summary(), color));
        out.push('\n');
        out
    }

    /// One-line total, e.g. "Total of 2 duplicate queries (5 executions)"
    pub fn summary(&self) -> String {
        format!(
            "Total of {} duplicate queries ({} executions)",
            self.total_duplicates, self.total_executions
        )
    }

    /// Write the text form to `out`
    ///
    /// # Errors
    /// * `OutputError::WriteFailed` - I/O error during write
    pub fn write_text(&self, out: &mut dyn Write, color: bool) -> Result<(), OutputError> {
        out.write_all(self.to_text(color).as_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Pretty-printed JSON form
    ///
    /// # Errors
    /// * `OutputError::SerializationFailed` - JSON serialization error
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{StackFrame, StackSnapshot};
    use crate::detector::QueryIdentity;

    fn registry_with(counts: &[(&str, u32)]) -> DuplicateRegistry {
        let mut registry = DuplicateRegistry::new();
        for (line, (sql, times)) in counts.iter().enumerate() {
            let snapshot = StackSnapshot::from_frames(vec![StackFrame::new("src/views.rs", line as u32 + 1)]);
            for _ in 0..*times {
                registry.observe(QueryIdentity::new(snapshot.key(), *sql), snapshot.clone());
            }
        }
        registry
    }

    #[test]
    fn test_build_counts() {
        let registry = registry_with(&[("SELECT a", 2), ("SELECT b", 1), ("SELECT c", 3)]);
        let report = DuplicateReport::build(&registry, &StackRenderer::default());

        assert_eq!(report.total_duplicates, 2);
        assert_eq!(report.total_executions, 5);
        assert_eq!(report.entries[0].sql, "SELECT a");
        assert_eq!(report.entries[1].executions, 3);
    }

    #[test]
    fn test_empty_report_has_no_text() {
        let registry = registry_with(&[("SELECT a", 1)]);
        let report = DuplicateReport::build(&registry, &StackRenderer::default());

        assert!(report.is_empty());
        assert_eq!(report.to_text(true), "");
    }

    #[test]
    fn test_text_without_color() {
        let registry = registry_with(&[("SELECT 1", 2)]);
        let report = DuplicateReport::build(&registry, &StackRenderer::default());

        let expected = "\nDuplicate queries detected!\n  File \"src/views.rs\", line 1\n  SQL: SELECT 1\n\n^^ The above query was executed 2 times ^^\n\nTotal of 1 duplicate queries (2 executions)\n";
        assert_eq!(report.to_text(false), expected);
    }

    #[test]
    fn test_text_with_color_wraps_banners() {
        let registry = registry_with(&[("SELECT 1", 2)]);
        let text = DuplicateReport::build(&registry, &StackRenderer::default()).to_text(true);

        assert!(text.contains("\x1b[33mDuplicate queries detected!\x1b[0m"));
        assert!(text.contains("\x1b[33mTotal of 1 duplicate queries (2 executions)\x1b[0m"));
    }

    #[test]
    fn test_json_contains_entries() {
        let registry = registry_with(&[("SELECT 1", 2)]);
        let report = DuplicateReport::build(&registry, &StackRenderer::default());

        let json = report.to_json().unwrap();
        let parsed: DuplicateReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
        assert!(json.contains("\"executions\": 2"));
    }
}
