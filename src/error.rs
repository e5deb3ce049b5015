use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while loading the CSV extracts into the warehouse.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A configured source CSV does not exist. `found` lists the CSV files
    /// that are present in `dir`.
    #[error("source file not found: {} (csv_dir = {}, csv files found = {:?})", .path.display(), .dir.display(), .found)]
    MissingSourceFile {
        dir: PathBuf,
        path: PathBuf,
        found: Vec<String>,
    },

    #[error("reading {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("converting column {column}: {source}")]
    Transform {
        column: String,
        #[source]
        source: arrow::error::ArrowError,
    },

    #[error("looking up columns of {table}: {source}")]
    SchemaLookup {
        table: String,
        #[source]
        source: duckdb::Error,
    },

    /// Bulk insert failed; nothing from `file` was kept in `table`.
    #[error("inserting into {table} from {file}: {source}")]
    Write {
        table: String,
        file: String,
        #[source]
        source: duckdb::Error,
    },

    /// A truncate statement failed and the whole truncation was rolled back.
    #[error("truncating {table}: {source}")]
    Truncation {
        table: String,
        #[source]
        source: duckdb::Error,
    },

    #[error(transparent)]
    Database(#[from] duckdb::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type LoadResult<T> = Result<T, LoadError>;
