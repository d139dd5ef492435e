//! The duplicate detector.
//!
//! Sits around every query execution of a connection: snapshots the call
//! stack, runs the query, and records (stack, SQL) in the registry. A query
//! counts as a duplicate only when both the stack and the SQL text match an
//! earlier execution.

use super::registry::{DuplicateRegistry, Observation, QueryIdentity};
use crate::capture::{NativeStackSource, StackSource};
use crate::db::{ExecuteWrapper, QueryCall, QueryResult};
use crate::render::{DuplicateReport, StackRenderer};
use crate::utils::error::{DetectionError, OutputError};
use log::{debug, trace};
use std::cell::{Ref, RefCell};
use std::io::Write;

/// Detects repeated (call stack, SQL) pairs within one unit of work
///
/// Not shareable between threads; give every unit of work its own detector.
pub struct DuplicateDetector {
    source: Box<dyn StackSource>,
    renderer: StackRenderer,
    registry: RefCell<DuplicateRegistry>,
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateDetector {
    /// Detector capturing the native stack
    ///
    /// **Public** - default constructor
    pub fn new() -> Self {
        Self::with_source(NativeStackSource::new())
    }

    pub fn with_source(source: impl StackSource + 'static) -> Self {
        Self::with_boxed_source(Box::new(source))
    }

    /// Detector over an already boxed source, without boxing it again
    pub fn with_boxed_source(source: Box<dyn StackSource>) -> Self {
        Self {
            source,
            renderer: StackRenderer::default(),
            registry: RefCell::new(DuplicateRegistry::new()),
        }
    }

    pub fn with_renderer(mut self, renderer: StackRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Run one query execution under observation
    ///
    /// **Public** - main entry point, called once per query
    ///
    /// # Arguments
    /// * `call` - SQL, parameters and batch flag (only the SQL matters for identity)
    /// * `execute` - Performs the real query; called exactly once
    ///
    /// # Returns
    /// Whatever `execute` returned, untouched
    ///
    /// The stack is captured before the query runs. A failed query leaves the
    /// registry as it was.
    pub fn execute<T, E, F>(&self, call: &QueryCall<'_>, execute: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let snapshot = self.source.as_ref().capture();

        let output = execute()?;

        let identity = QueryIdentity::new(snapshot.key(), call.sql);
        match self.registry.borrow_mut().observe(identity, snapshot) {
            Observation::First(index) => {
                trace!("New query #{} [{}]: {}", index, call.context.alias, call.sql);
            }
            Observation::Repeat { index, repeats } => {
                debug!(
                    "Duplicate query #{} [{}] executed {} times: {}",
                    index,
                    call.context.alias,
                    repeats + 1,
                    call.sql
                );
            }
        }

        Ok(output)
    }

    /// True once any identity has been executed more than once
    pub fn has_duplicates(&self) -> bool {
        self.registry.borrow().has_duplicates()
    }

    pub fn duplicate_count(&self) -> usize {
        self.registry.borrow().duplicate_count()
    }

    pub fn total_executions(&self) -> u64 {
        self.registry.borrow().total_executions()
    }

    /// Read access to the registry
    ///
    /// Do not hold the returned borrow across query executions.
    pub fn registry(&self) -> Ref<'_, DuplicateRegistry> {
        self.registry.borrow()
    }

    pub fn renderer(&self) -> &StackRenderer {
        &self.renderer
    }

    /// Build the report of everything duplicated so far
    pub fn report(&self) -> DuplicateReport {
        DuplicateReport::build(&self.registry.borrow(), &self.renderer)
    }

    /// Write the text report; writes nothing when there are no duplicates
    ///
    /// **Public** - called at the end of a session
    pub fn print_duplicates(&self, out: &mut dyn Write, color: bool) -> Result<(), OutputError> {
        let report = self.report();
        if report.is_empty() {
            return Ok(());
        }
        report.write_text(out, color)
    }

    /// The escalation error for the current state, if there is anything to escalate
    pub fn escalation(&self) -> Option<DetectionError> {
        let registry = self.registry.borrow();
        if !registry.has_duplicates() {
            return None;
        }
        Some(DetectionError::DuplicatesDetected {
            queries: registry.duplicate_count(),
            executions: registry.total_executions(),
        })
    }
}

impl ExecuteWrapper for DuplicateDetector {
    fn around_execute(
        &self,
        call: &QueryCall<'_>,
        execute: &mut dyn FnMut() -> QueryResult,
    ) -> QueryResult {
        self.execute(call, execute)
    }
}
