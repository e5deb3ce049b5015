use crate::error::{LoadError, LoadResult};
use crate::process::utils::null_regex;
use arrow::compute::concat_batches;
use arrow::csv::{reader::Format, ReaderBuilder};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const READ_BATCH_ROWS: usize = 64 * 1024;

/// Read a whole CSV file (with header) into one RecordBatch.
///
/// Column types are inferred from every record in the file, so a column
/// never changes type half way through. Blank cells and the usual
/// missing-value sentinels load as null.
pub fn read_csv(path: &Path) -> LoadResult<RecordBatch> {
    let wrap = |source: ArrowError| LoadError::SourceRead {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path)?;
    let format = Format::default()
        .with_header(true)
        .with_null_regex(null_regex());

    let (schema, records) = format.infer_schema(&mut file, None).map_err(wrap)?;
    debug!(file = %path.display(), records, columns = schema.fields().len(), "inferred schema");
    file.seek(SeekFrom::Start(0))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(schema.clone())
        .with_format(format)
        .with_batch_size(READ_BATCH_ROWS)
        .build(file)
        .map_err(wrap)?;

    let batches = reader.collect::<Result<Vec<_>, _>>().map_err(wrap)?;
    concat_batches(&schema, &batches).map_err(wrap)
}
