//! Connection with an installable chain of execute wrappers.
//!
//! Wrappers run outermost first in installation order; the innermost link
//! calls the backend. Each wrapper must call `execute` exactly once and hand
//! back its result.

use super::types::{ExecutionContext, QueryCall, QueryOutput, QueryParams, QueryResult, SqlValue};
use crate::utils::error::QueryError;
use log::debug;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Intercepts query executions on a connection
pub trait ExecuteWrapper {
    fn around_execute(
        &self,
        call: &QueryCall<'_>,
        execute: &mut dyn FnMut() -> QueryResult,
    ) -> QueryResult;
}

/// Runs SQL for a connection
pub trait Backend {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> QueryResult;

    /// Run `sql` once per parameter set
    fn execute_many(&mut self, sql: &str, param_sets: &[Vec<SqlValue>]) -> QueryResult {
        let mut rows_affected = 0;
        for params in param_sets {
            rows_affected += self.execute(sql, params)?.rows_affected;
        }
        Ok(QueryOutput::affected(rows_affected))
    }
}

/// Installed wrappers of one connection
#[derive(Default)]
pub struct WrapperStack {
    wrappers: RefCell<Vec<(u64, Rc<dyn ExecuteWrapper>)>>,
    next_id: Cell<u64>,
}

impl WrapperStack {
    fn push(&self, wrapper: Rc<dyn ExecuteWrapper>) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.wrappers.borrow_mut().push((id, wrapper));
        id
    }

    fn remove(&self, id: u64) {
        self.wrappers.borrow_mut().retain(|(installed, _)| *installed != id);
    }

    fn snapshot(&self) -> Vec<Rc<dyn ExecuteWrapper>> {
        self.wrappers
            .borrow()
            .iter()
            .map(|(_, wrapper)| Rc::clone(wrapper))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.wrappers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.borrow().is_empty()
    }
}

/// Keeps a wrapper installed until dropped
#[must_use = "the wrapper is uninstalled as soon as the handle is dropped"]
pub struct WrapperHandle<'c> {
    stack: &'c WrapperStack,
    id: u64,
}

impl Drop for WrapperHandle<'_> {
    fn drop(&mut self) {
        self.stack.remove(self.id);
    }
}

/// A database connection whose executions can be wrapped
pub struct Connection<B> {
    alias: String,
    backend: RefCell<B>,
    wrappers: WrapperStack,
    calls: Cell<u64>,
}

impl<B: Backend> Connection<B> {
    pub fn new(backend: B) -> Self {
        Self::with_alias("default", backend)
    }

    pub fn with_alias(alias: impl Into<String>, backend: B) -> Self {
        Self {
            alias: alias.into(),
            backend: RefCell::new(backend),
            wrappers: WrapperStack::default(),
            calls: Cell::new(0),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Install `wrapper` around every execution until the handle drops
    ///
    /// **Public** - how detectors attach themselves
    pub fn execute_wrapper(&self, wrapper: Rc<dyn ExecuteWrapper>) -> WrapperHandle<'_> {
        let id = self.wrappers.push(wrapper);
        debug!("Installed execute wrapper #{} on '{}'", id, self.alias);
        WrapperHandle {
            stack: &self.wrappers,
            id,
        }
    }

    pub fn wrappers(&self) -> &WrapperStack {
        &self.wrappers
    }

    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> QueryResult {
        self.dispatch(sql, QueryParams::Single(params))
    }

    /// Batch execution: one SQL statement, many parameter sets
    pub fn execute_many(&self, sql: &str, param_sets: &[Vec<SqlValue>]) -> QueryResult {
        self.dispatch(sql, QueryParams::Many(param_sets))
    }

    /// Direct access to the backend, bypassing wrappers
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> Result<R, QueryError> {
        let mut backend = self.backend.try_borrow_mut().map_err(|_| QueryError::Busy)?;
        Ok(f(&mut *backend))
    }

    fn dispatch(&self, sql: &str, params: QueryParams<'_>) -> QueryResult {
        let sequence = self.calls.get();
        self.calls.set(sequence + 1);

        let context = ExecutionContext::new(self.alias.clone(), sequence);
        let call = QueryCall::new(sql, params, &context);

        // Cloned so wrappers may install or remove wrappers while running
        let wrappers = self.wrappers.snapshot();
        run_chain(&wrappers, &call, &mut || self.run_backend(&call))
    }

    fn run_backend(&self, call: &QueryCall<'_>) -> QueryResult {
        let mut backend = self.backend.try_borrow_mut().map_err(|_| QueryError::Busy)?;
        match call.params {
            QueryParams::Single(params) => backend.execute(call.sql, params),
            QueryParams::Many(param_sets) => backend.execute_many(call.sql, param_sets),
        }
    }
}

fn run_chain(
    wrappers: &[Rc<dyn ExecuteWrapper>],
    call: &QueryCall<'_>,
    innermost: &mut dyn FnMut() -> QueryResult,
) -> QueryResult {
    match wrappers.split_first() {
        None => innermost(),
        Some((outer, rest)) => outer.around_execute(call, &mut || run_chain(rest, call, &mut *innermost)),
    }
}
