//! Captured call stacks and their comparable keys.
//!
//! A `StackSnapshot` keeps every frame it was given, oldest caller first.
//! Nothing is filtered here; the renderer decides what to hide.

use super::template::TemplateNode;

/// What kind of code a frame belongs to
///
/// Decided once at capture time so rendering never has to probe frames again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Ordinary native frame (file, line, function)
    Standard,

    /// Template engine evaluating a node
    Template(TemplateNode),
}

/// One call-site observation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackFrame {
    /// File path, or template origin name for template frames
    pub source: String,

    /// Line number (0 when unknown)
    pub line: u32,

    /// Demangled function name, if resolved
    pub function: Option<String>,

    /// Return address of the native frame; stable for one call site within a process
    pub address: Option<usize>,

    pub kind: FrameKind,
}

impl StackFrame {
    /// Create a standard frame
    ///
    /// **Public** - constructor
    pub fn new(source: impl Into<String>, line: u32) -> Self {
        Self {
            source: source.into(),
            line,
            function: None,
            address: None,
            kind: FrameKind::Standard,
        }
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_address(mut self, address: usize) -> Self {
        self.address = Some(address);
        self
    }

    /// Create a frame for a template node being evaluated
    ///
    /// **Public** - used by stack sources when merging template frames
    pub fn template(node: TemplateNode) -> Self {
        Self {
            source: node.origin.clone(),
            line: node.lineno,
            function: None,
            address: None,
            kind: FrameKind::Template(node),
        }
    }

    pub fn is_template(&self) -> bool {
        matches!(self.kind, FrameKind::Template(_))
    }

    pub fn template_node(&self) -> Option<&TemplateNode> {
        match &self.kind {
            FrameKind::Template(node) => Some(node),
            FrameKind::Standard => None,
        }
    }

    fn key(&self) -> FrameKey {
        FrameKey {
            source: self.source.clone(),
            line: self.line,
            function: self.function.clone(),
            address: self.address,
            template: self.template_node().map(|node| node.id),
        }
    }
}

/// Value form of a frame used for identity comparison
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    pub source: String,
    pub line: u32,
    pub function: Option<String>,
    pub address: Option<usize>,
    pub template: Option<u64>,
}

/// Order-preserving, hashable identity of a whole stack
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackKey(Vec<FrameKey>);

impl StackKey {
    pub fn frames(&self) -> &[FrameKey] {
        &self.0
    }
}

/// Ordered call stack, oldest caller first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackSnapshot {
    frames: Vec<StackFrame>,
}

impl StackSnapshot {
    /// Build a snapshot from frames already ordered oldest first
    ///
    /// **Public** - used by every stack source
    pub fn from_frames(frames: Vec<StackFrame>) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &[StackFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The frame that called the frame at `index`
    ///
    /// Frames are stored oldest first, so the caller is the previous entry.
    pub fn caller_of(&self, index: usize) -> Option<&StackFrame> {
        index.checked_sub(1).and_then(|i| self.frames.get(i))
    }

    /// Derive the comparable identity of this stack
    ///
    /// **Public** - used by the detector for duplicate lookup
    pub fn key(&self) -> StackKey {
        StackKey(self.frames.iter().map(StackFrame::key).collect())
    }
}
