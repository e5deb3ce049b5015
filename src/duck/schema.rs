use super::TableRef;
use crate::error::{LoadError, LoadResult};
use duckdb::{params, Connection};

const COLUMNS_SQL: &str = "
    SELECT column_name
    FROM information_schema.columns
    WHERE table_schema = ? AND table_name = ?
    ORDER BY ordinal_position";

/// Column names currently defined for `target`, by position.
/// An unknown table yields an empty list, not an error.
pub fn table_columns(conn: &Connection, target: &TableRef) -> LoadResult<Vec<String>> {
    query_columns(conn, COLUMNS_SQL, target)
}

fn query_columns(conn: &Connection, sql: &str, target: &TableRef) -> LoadResult<Vec<String>> {
    let wrap = |source| LoadError::SchemaLookup {
        table: target.to_string(),
        source,
    };

    let mut stmt = conn.prepare(sql).map_err(wrap)?;
    let rows = stmt
        .query_map(params![target.schema, target.table], |r| r.get::<_, String>(0))
        .map_err(wrap)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(wrap)
}
