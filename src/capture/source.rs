//! Stack sources: where snapshots come from.
//!
//! `NativeStackSource` walks the real thread stack. `ManualStackSource` hands
//! out whatever call site the host last set, for hosts that track call sites
//! themselves and for deterministic tests.

use super::snapshot::{FrameKind, StackFrame, StackSnapshot};
use super::template::{self, FramePosition, TemplateNode};
use crate::utils::config::UNKNOWN_SOURCE;
use log::trace;
use std::cell::RefCell;
use std::rc::Rc;

/// Produces a snapshot of the current call stack
pub trait StackSource {
    /// Capture the stack, oldest caller first, without dropping frames
    fn capture(&self) -> StackSnapshot;
}

impl<S: StackSource + ?Sized> StackSource for Rc<S> {
    fn capture(&self) -> StackSnapshot {
        (**self).capture()
    }
}

impl<S: StackSource + ?Sized> StackSource for Box<S> {
    fn capture(&self) -> StackSnapshot {
        (**self).capture()
    }
}

/// Captures the live native stack of the calling thread
///
/// Inlined functions resolve to one frame each; all of them carry the return
/// address of their physical frame, so call sites stay apart even when no
/// line information is available. Template frames entered on this thread are
/// spliced in right after the native frame that entered them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeStackSource;

impl NativeStackSource {
    pub fn new() -> Self {
        Self
    }
}

impl StackSource for NativeStackSource {
    fn capture(&self) -> StackSnapshot {
        let mut raw = Vec::new();
        backtrace::trace(|frame| {
            raw.push(frame.clone());
            true
        });
        // trace() walks innermost first
        raw.reverse();

        let positions: Vec<FramePosition> = raw.iter().map(FramePosition::of).collect();
        let mut entered: Vec<(usize, TemplateNode)> = template::entered()
            .into_iter()
            .map(|entry| (entry.splice_position(&positions), entry.node))
            .collect();
        // Stable: templates entered from one frame keep their entry order
        entered.sort_by_key(|(position, _)| *position);

        let mut frames = Vec::with_capacity(raw.len() + entered.len());
        let mut pending = entered.into_iter().peekable();

        for (position, frame) in raw.iter().enumerate() {
            while let Some((_, node)) = pending.next_if(|(at, _)| *at <= position) {
                frames.push(StackFrame::template(node));
            }
            frames.extend(resolve(frame));
        }
        frames.extend(pending.map(|(_, node)| StackFrame::template(node)));

        trace!("Captured native stack: {} raw frames, {} frames", raw.len(), frames.len());

        StackSnapshot::from_frames(frames)
    }
}

/// Resolve one raw frame into one frame per symbol, outermost inline first
fn resolve(frame: &backtrace::Frame) -> Vec<StackFrame> {
    let address = frame.ip() as usize;
    let mut symbols = Vec::new();
    backtrace::resolve_frame(frame, |symbol| {
        let source = symbol
            .filename()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        symbols.push(StackFrame {
            source,
            line: symbol.lineno().unwrap_or(0),
            function: symbol.name().map(|name| format!("{:#}", name)),
            address: Some(address),
            kind: FrameKind::Standard,
        });
    });

    if symbols.is_empty() {
        symbols.push(StackFrame::new(UNKNOWN_SOURCE, 0).with_address(address));
    }

    // resolve_frame yields the innermost inlined symbol first
    symbols.reverse();
    symbols
}

/// Returns the call site most recently set by the host
#[derive(Debug, Default)]
pub struct ManualStackSource {
    current: RefCell<StackSnapshot>,
}

impl ManualStackSource {
    pub fn new(initial: StackSnapshot) -> Self {
        Self {
            current: RefCell::new(initial),
        }
    }

    /// Replace the call site returned by subsequent captures
    pub fn set(&self, snapshot: StackSnapshot) {
        *self.current.borrow_mut() = snapshot;
    }
}

impl StackSource for ManualStackSource {
    fn capture(&self) -> StackSnapshot {
        self.current.borrow().clone()
    }
}
