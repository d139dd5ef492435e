//! Values passed through the query execution path.

use crate::utils::error::QueryError;
use serde::{Deserialize, Serialize};

/// A bound parameter or a result cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// Result of one execution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    /// Column names, empty for statements that return no rows
    pub columns: Vec<String>,

    pub rows: Vec<Vec<SqlValue>>,

    /// Rows changed by a write statement
    pub rows_affected: usize,
}

impl QueryOutput {
    pub fn affected(rows_affected: usize) -> Self {
        Self {
            rows_affected,
            ..Default::default()
        }
    }
}

pub type QueryResult = Result<QueryOutput, QueryError>;

/// Parameters of a call: one set, or many for a batch execution
#[derive(Debug, Clone, Copy)]
pub enum QueryParams<'a> {
    Single(&'a [SqlValue]),
    Many(&'a [Vec<SqlValue>]),
}

/// Opaque per-call context handed to wrappers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Name of the connection the call runs on
    pub alias: String,

    /// Position of this call among the connection's calls
    pub sequence: u64,
}

impl ExecutionContext {
    pub fn new(alias: impl Into<String>, sequence: u64) -> Self {
        Self {
            alias: alias.into(),
            sequence,
        }
    }
}

/// Everything a wrapper gets to see about a call
#[derive(Debug, Clone, Copy)]
pub struct QueryCall<'a> {
    pub sql: &'a str,
    pub params: QueryParams<'a>,
    pub context: &'a ExecutionContext,
}

impl<'a> QueryCall<'a> {
    pub fn new(sql: &'a str, params: QueryParams<'a>, context: &'a ExecutionContext) -> Self {
        Self {
            sql,
            params,
            context,
        }
    }

    /// True for batch executions
    pub fn many(&self) -> bool {
        matches!(self.params, QueryParams::Many(_))
    }
}
