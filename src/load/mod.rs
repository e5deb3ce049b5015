//! Record loader: one CSV file into one destination table.

use crate::duck::{insert, TableRef, Warehouse};
use crate::error::{LoadError, LoadResult};
use crate::process::{convert, reader, transform, utils};
use arrow::record_batch::RecordBatch;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// How one source file maps onto one destination table.
#[derive(Debug, Clone)]
pub struct LoadSpec {
    pub source: PathBuf,
    pub target: TableRef,
    /// source column → destination column
    pub rename: HashMap<String, String>,
    pub parse_dates: Vec<String>,
    pub batch_size: usize,
}

impl LoadSpec {
    pub fn new(source: impl Into<PathBuf>, target: TableRef, batch_size: usize) -> Self {
        Self {
            source: source.into(),
            target,
            rename: HashMap::new(),
            parse_dates: Vec::new(),
            batch_size,
        }
    }

    pub fn with_parse_dates<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_dates = cols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rename<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.rename = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    pub fn file_name(&self) -> String {
        file_name(&self.source)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Outcome of a successful `load_csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub table: TableRef,
    pub file: String,
    pub rows: usize,
    pub batches: usize,
    pub batch_size: usize,
}

/// Cast to bindable types and append. Every failure here is a write failure.
fn write(
    warehouse: &mut Warehouse,
    spec: &LoadSpec,
    batch: &RecordBatch,
) -> LoadResult<insert::WriteStats> {
    let batch = convert::prepare_for_write(batch)?;
    let max_params = warehouse.max_bind_parameters();
    insert::append_batches(
        warehouse.connection_mut(),
        &spec.target,
        &batch,
        spec.batch_size,
        max_params,
    )
    .map_err(|source| LoadError::Write {
        table: spec.target.to_string(),
        file: spec.file_name(),
        source,
    })
}

/// Read `spec.source`, reshape it to fit `spec.target`, and append it.
pub fn load_csv(warehouse: &mut Warehouse, spec: &LoadSpec) -> LoadResult<LoadSummary> {
    let path = &spec.source;
    if !path.exists() {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        return Err(LoadError::MissingSourceFile {
            found: utils::list_csv_files(&dir),
            dir,
            path: path.clone(),
        });
    }
    let start = Instant::now();

    let batch = reader::read_csv(path)?;
    debug!(file = %spec.file_name(), rows = batch.num_rows(), "read csv");

    let batch = transform::rename_columns(&batch, &spec.rename)?;
    let batch = transform::parse_date_columns(&batch, &spec.parse_dates)?;
    let batch = transform::normalize_missing(&batch)?;

    let destination = warehouse.table_columns(&spec.target)?;
    let batch = transform::retain_columns(&batch, &destination)?;
    if batch.num_columns() == 0 {
        debug!(table = %spec.target, file = %spec.file_name(), "no columns match destination");
    }

    let stats = match write(warehouse, spec, &batch) {
        Ok(stats) => stats,
        Err(e) => {
            error!(
                table = %spec.target,
                file = %spec.file_name(),
                detail = ?e,
                "insert failed"
            );
            return Err(e);
        }
    };

    info!(
        table = %spec.target,
        rows = stats.rows,
        batch_size = spec.batch_size,
        batches = stats.batches(),
        elapsed = ?start.elapsed(),
        "loaded"
    );

    Ok(LoadSummary {
        table: spec.target.clone(),
        file: spec.file_name(),
        rows: stats.rows,
        batches: stats.batches(),
        batch_size: spec.batch_size,
    })
}
