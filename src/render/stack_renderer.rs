//! Render captured stacks as readable, compressed traces.
//!
//! Example output:
//! ```text
//!   ......
//!   File "src/views.rs", line 42, in shop::views::order_list
//!   File "orders.html", line 7
//!     {% for line in order.lines %}
//!   ....
//! ```
//! Each `.` stands for one third-party frame that was compressed away. The
//! detector's own frames (connection dispatch, wrappers, capture) compress
//! the same way.

use crate::capture::{StackFrame, StackSnapshot, TemplateNode};
use crate::utils::config::{
    COMPRESSION_MARK, DEFAULT_THIRD_PARTY_MARKERS, FRAME_INDENT, OWN_FUNCTION_PREFIX, SOURCE_INDENT,
    UNKNOWN_SOURCE,
};

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Collapse third-party frames into marks
    pub compress: bool,

    /// Path fragments identifying third-party sources
    pub third_party_markers: Vec<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            compress: true,
            third_party_markers: DEFAULT_THIRD_PARTY_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn with_third_party_marker(mut self, marker: impl Into<String>) -> Self {
        self.third_party_markers.push(marker.into());
        self
    }
}

/// Turns snapshots into text
#[derive(Debug, Clone, Default)]
pub struct StackRenderer {
    options: RenderOptions,
}

impl StackRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a snapshot, oldest frame at the top
    ///
    /// **Public** - used for every duplicate in the report
    ///
    /// # Algorithm
    /// 1. Runs of compressible frames become one line of `.` marks
    /// 2. Template frames print origin, line and source text, skipping
    ///    frames whose caller evaluates the very same node
    /// 3. Everything else prints as `File "<source>", line <n>, in <function>`
    pub fn render(&self, snapshot: &StackSnapshot) -> String {
        let mut out = String::new();
        let mut gap = false;

        for (index, frame) in snapshot.frames().iter().enumerate() {
            if self.is_compressible(frame) {
                if !gap {
                    out.push_str(FRAME_INDENT);
                    gap = true;
                }
                out.push(COMPRESSION_MARK);
                continue;
            }

            if gap {
                out.push('\n');
                gap = false;
            }

            match frame.template_node() {
                Some(node) => {
                    if repeats_caller_node(snapshot, index, node) {
                        continue;
                    }
                    out.push_str(&format_template_frame(node));
                }
                None => out.push_str(&format_standard_frame(frame)),
            }
        }

        if gap {
            out.push('\n');
        }

        out
    }

    /// Third-party or detector-internal, non-template frame with compression switched on
    pub fn is_compressible(&self, frame: &StackFrame) -> bool {
        self.options.compress
            && !frame.is_template()
            && (self.is_third_party(&frame.source) || is_own_frame(frame))
    }

    /// Unresolved frames count as third-party: there is nothing to show for them
    pub fn is_third_party(&self, source: &str) -> bool {
        if source == UNKNOWN_SOURCE {
            return true;
        }
        let normalized = source.replace('\\', "/");
        self.options
            .third_party_markers
            .iter()
            .any(|marker| normalized.contains(marker.as_str()))
    }
}

/// Frame of this crate, including its trait impls (`<duplicate_queries::... as ...>`)
fn is_own_frame(frame: &StackFrame) -> bool {
    frame.function.as_deref().is_some_and(|function| {
        function
            .strip_prefix('<')
            .unwrap_or(function)
            .starts_with(OWN_FUNCTION_PREFIX)
    })
}

/// Several frames usually evaluate one template node; print it only once
fn repeats_caller_node(snapshot: &StackSnapshot, index: usize, node: &TemplateNode) -> bool {
    snapshot
        .caller_of(index)
        .and_then(StackFrame::template_node)
        .is_some_and(|caller| caller == node)
}

fn format_template_frame(node: &TemplateNode) -> String {
    format!(
        "{}File \"{}\", line {}\n{}{}\n",
        FRAME_INDENT, node.origin, node.lineno, SOURCE_INDENT, node.contents
    )
}

fn format_standard_frame(frame: &StackFrame) -> String {
    match &frame.function {
        Some(function) => format!(
            "{}File \"{}\", line {}, in {}\n",
            FRAME_INDENT, frame.source, frame.line, function
        ),
        None => format!("{}File \"{}\", line {}\n", FRAME_INDENT, frame.source, frame.line),
    }
}
