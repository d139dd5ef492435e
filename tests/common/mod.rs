#![allow(dead_code)]

use duplicate_queries::capture::ManualStackSource;
use duplicate_queries::db::QueryResult;
use duplicate_queries::{Backend, QueryError, QueryOutput, SqlValue, StackFrame, StackSnapshot};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Report sink the test can read back after the session wrote to it
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Backend answering every query with one row, optionally failing one call
#[derive(Default)]
pub struct RecordingBackend {
    pub executed: Vec<String>,
    pub fail_on_call: Option<usize>,
}

impl RecordingBackend {
    pub fn failing_on(call: usize) -> Self {
        Self {
            executed: Vec::new(),
            fail_on_call: Some(call),
        }
    }
}

impl Backend for RecordingBackend {
    fn execute(&mut self, sql: &str, _params: &[SqlValue]) -> QueryResult {
        self.executed.push(sql.to_string());
        if self.fail_on_call == Some(self.executed.len()) {
            return Err(QueryError::Database("connection reset".to_string()));
        }
        Ok(QueryOutput {
            columns: vec!["value".to_string()],
            rows: vec![vec![SqlValue::Integer(1)]],
            rows_affected: 0,
        })
    }
}

/// A call site inside application code, reached through some vendored frames
pub fn site(function: &str, line: u32) -> StackSnapshot {
    StackSnapshot::from_frames(vec![
        StackFrame::new("/rustc/abc123/library/std/src/rt.rs", 148).with_function("std::rt::lang_start"),
        StackFrame::new("src/main.rs", 12).with_function("shop::main"),
        StackFrame::new("/home/dev/.cargo/registry/src/index/router-0.3.1/src/lib.rs", 88)
            .with_function("router::dispatch"),
        StackFrame::new("src/views.rs", line).with_function(function),
    ])
}

pub fn manual_source(snapshot: StackSnapshot) -> Rc<ManualStackSource> {
    Rc::new(ManualStackSource::new(snapshot))
}
