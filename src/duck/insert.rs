use super::{quote_ident, TableRef};
use crate::process::convert::row_values;
use arrow::record_batch::RecordBatch;
use duckdb::{params_from_iter, Connection};
use std::ops::Range;
use std::time::Instant;
use tracing::debug;

/// What an append did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub rows: usize,
    /// Row count of each batched write, in order.
    pub batch_rows: Vec<usize>,
    pub statements: usize,
}

impl WriteStats {
    pub fn batches(&self) -> usize {
        self.batch_rows.len()
    }
}

/// Split `total` rows into consecutive ranges of at most `batch_size`.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let step = batch_size.max(1);
    (0..total)
        .step_by(step)
        .map(|start| start..(start + step).min(total))
        .collect()
}

/// Rows that fit in one statement while binding fewer than `max_params` values.
pub fn rows_per_statement(columns: usize, max_params: usize) -> usize {
    if columns == 0 {
        return 0;
    }
    (max_params.saturating_sub(1) / columns).max(1)
}

fn insert_sql(target: &TableRef, columns: &[String], rows: usize) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let one = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![one.as_str(); rows].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        target.sql(),
        cols.join(", "),
        values
    )
}

/// Append every row of `batch` to `target` in batches of `batch_size` rows.
///
/// The whole append runs in one transaction: either every row lands or none
/// do. Inside a batch rows go out as multi-row INSERTs sized to stay under
/// `max_params` bound values per statement.
pub fn append_batches(
    conn: &mut Connection,
    target: &TableRef,
    batch: &RecordBatch,
    batch_size: usize,
    max_params: usize,
) -> duckdb::Result<WriteStats> {
    let mut stats = WriteStats::default();
    let columns: Vec<String> = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    if columns.is_empty() || batch.num_rows() == 0 {
        return Ok(stats);
    }

    let per_stmt = rows_per_statement(columns.len(), max_params);
    let full_sql = insert_sql(target, &columns, per_stmt);

    let tx = conn.transaction()?;
    for range in plan_batches(batch.num_rows(), batch_size) {
        let start = Instant::now();
        let mut offset = range.start;
        while offset < range.end {
            let len = per_stmt.min(range.end - offset);
            let values = row_values(batch, offset, len)?;
            if len == per_stmt {
                let mut stmt = tx.prepare_cached(&full_sql)?;
                stmt.execute(params_from_iter(values.iter()))?;
            } else {
                let mut stmt = tx.prepare(&insert_sql(target, &columns, len))?;
                stmt.execute(params_from_iter(values.iter()))?;
            }
            stats.statements += 1;
            offset += len;
        }
        stats.rows += range.len();
        stats.batch_rows.push(range.len());
        debug!(
            table = %target,
            rows = range.len(),
            elapsed = ?start.elapsed(),
            "batch written"
        );
    }
    tx.commit()?;

    Ok(stats)
}
