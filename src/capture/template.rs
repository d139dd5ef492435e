//! Template frames entered on the current thread.
//!
//! A template engine has no native frame that says "evaluating line 12 of
//! index.html". Instead it calls [`enter`] while evaluating a node and holds
//! the returned guard; any stack captured meanwhile on this thread gets a
//! template frame spliced in right after the native frame that entered it.
//!
//! The entering frame is located by the native path recorded on entry: a
//! later capture shares that path up to the entering frame, whose return
//! address then differs because it has moved on to another call.

use std::cell::RefCell;
use std::marker::PhantomData;

/// Metadata of a template node under evaluation
///
/// `id` is assigned by the engine and identifies the node object itself;
/// two nodes with the same origin and line are still different nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateNode {
    pub id: u64,

    /// Template name as the engine reports it
    pub origin: String,

    pub lineno: u32,

    /// Literal source text of the node's token
    pub contents: String,
}

impl TemplateNode {
    pub fn new(id: u64, origin: impl Into<String>, lineno: u32, contents: impl Into<String>) -> Self {
        Self {
            id,
            origin: origin.into(),
            lineno,
            contents: contents.into(),
        }
    }
}

/// Where one raw native frame sat: its return address and stack pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePosition {
    pub ip: usize,

    /// Null when the unwinder cannot recover it
    pub sp: usize,
}

impl FramePosition {
    pub fn of(frame: &backtrace::Frame) -> Self {
        Self {
            ip: frame.ip() as usize,
            sp: frame.sp() as usize,
        }
    }
}

/// A node on the thread's template stack together with where it was entered
#[derive(Debug, Clone)]
pub struct EnteredTemplate {
    pub node: TemplateNode,

    /// Native path at entry, oldest frame first
    pub path: Vec<FramePosition>,
}

impl EnteredTemplate {
    /// Index in `captured` (oldest first) before which the template frame goes
    ///
    /// Frames up to and including the one that called [`enter`] come first;
    /// that frame is the first one whose position no longer matches.
    pub fn splice_position(&self, captured: &[FramePosition]) -> usize {
        let shared = self
            .path
            .iter()
            .zip(captured)
            .take_while(|(entered, captured)| entered == captured)
            .count();
        (shared + 1).min(captured.len())
    }
}

thread_local! {
    static TEMPLATE_STACK: RefCell<Vec<EnteredTemplate>> = const { RefCell::new(Vec::new()) };
}

/// Keeps a template frame on the thread's stack until dropped
#[must_use = "the template frame is popped as soon as the guard is dropped"]
pub struct TemplateFrameGuard {
    index: usize,
    // Tied to the thread-local stack it pushed onto
    _not_send: PhantomData<*const ()>,
}

impl Drop for TemplateFrameGuard {
    fn drop(&mut self) {
        TEMPLATE_STACK.with(|stack| stack.borrow_mut().truncate(self.index));
    }
}

/// Mark `node` as being evaluated on this thread
///
/// **Public** - called by template engine integrations
#[inline(never)]
pub fn enter(node: TemplateNode) -> TemplateFrameGuard {
    let path = native_path();
    TEMPLATE_STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let index = stack.len();
        stack.push(EnteredTemplate { node, path });
        TemplateFrameGuard {
            index,
            _not_send: PhantomData,
        }
    })
}

/// Snapshot of the template frames currently entered, outermost first
pub fn entered() -> Vec<EnteredTemplate> {
    TEMPLATE_STACK.with(|stack| stack.borrow().clone())
}

/// Positions of the raw native frames of the current thread, oldest first
pub fn native_path() -> Vec<FramePosition> {
    let mut path = Vec::new();
    backtrace::trace(|frame| {
        path.push(FramePosition::of(frame));
        true
    });
    path.reverse();
    path
}
