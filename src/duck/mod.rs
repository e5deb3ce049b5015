//! DuckDB destination: connection, truncation, counts.

pub mod insert;
pub mod schema;

use crate::error::{LoadError, LoadResult};
use duckdb::Connection;
use std::fmt;
use tracing::{debug, info};

pub use insert::{plan_batches, rows_per_statement, WriteStats};

/// `schema.table` in the destination database.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Quoted form for use in SQL text.
    pub fn sql(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Owns the single connection every load step goes through.
pub struct Warehouse {
    conn: Connection,
    max_bind_parameters: usize,
}

impl Warehouse {
    /// Open a DuckDB database on disk at `path`; `:memory:` opens an in-memory one.
    pub fn open(path: &str) -> LoadResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        debug!(database = %path, "opened warehouse");
        Ok(Self {
            conn,
            max_bind_parameters: 2_100,
        })
    }

    pub fn with_max_bind_parameters(mut self, max: usize) -> Self {
        self.max_bind_parameters = max;
        self
    }

    pub fn max_bind_parameters(&self) -> usize {
        self.max_bind_parameters
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Column names of `target`, by ordinal position.
    pub fn table_columns(&self, target: &TableRef) -> LoadResult<Vec<String>> {
        schema::table_columns(&self.conn, target)
    }

    /// Truncate `tables` in order inside one transaction.
    /// Any failure rolls all of them back.
    pub fn truncate_all(&mut self, tables: &[TableRef]) -> LoadResult<()> {
        let tx = self.conn.transaction()?;
        for target in tables {
            tx.execute_batch(&format!("TRUNCATE TABLE {};", target.sql()))
                .map_err(|source| LoadError::Truncation {
                    table: target.to_string(),
                    source,
                })?;
            debug!(table = %target, "truncated");
        }
        tx.commit()?;
        info!(tables = tables.len(), "truncation committed");
        Ok(())
    }

    pub fn row_count(&self, target: &TableRef) -> LoadResult<i64> {
        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", target.sql()),
            [],
            |r| r.get(0),
        )?;
        Ok(n)
    }
}
