//! SQLite backend over rusqlite.

use super::connection::Backend;
use super::types::{QueryOutput, QueryResult, SqlValue};
use crate::utils::error::QueryError;
use log::trace;
use rusqlite::types::Value;
use rusqlite::params_from_iter;
use std::path::Path;

/// Executes statements on a rusqlite connection
pub struct SqliteBackend {
    conn: rusqlite::Connection,
}

impl SqliteBackend {
    pub fn open_in_memory() -> Result<Self, QueryError> {
        Ok(Self {
            conn: rusqlite::Connection::open_in_memory()?,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, QueryError> {
        Ok(Self {
            conn: rusqlite::Connection::open(path)?,
        })
    }

    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Run a script of statements outside any wrapper (schema setup)
    pub fn execute_batch(&self, sql: &str) -> Result<(), QueryError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl Backend for SqliteBackend {
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> QueryResult {
        trace!("sqlite: {}", sql);

        let mut stmt = self.conn.prepare(sql)?;
        let values: Vec<Value> = params.iter().map(to_sqlite).collect();
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            let rows_affected = stmt.execute(params_from_iter(values))?;
            return Ok(QueryOutput::affected(rows_affected));
        }

        let mut rows = stmt.query(params_from_iter(values))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Vec::with_capacity(columns.len());
            for index in 0..columns.len() {
                record.push(from_sqlite(row.get::<_, Value>(index)?));
            }
            records.push(record);
        }

        Ok(QueryOutput {
            columns,
            rows: records,
            rows_affected: 0,
        })
    }
}

fn to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(v) => Value::Integer(*v),
        SqlValue::Real(v) => Value::Real(*v),
        SqlValue::Text(v) => Value::Text(v.clone()),
        SqlValue::Blob(v) => Value::Blob(v.clone()),
    }
}

fn from_sqlite(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(v),
        Value::Real(v) => SqlValue::Real(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Blob(v),
    }
}
