use crate::error::{LoadError, LoadResult};
use crate::process::{date_parser, utils};
use arrow::array::{Array, ArrayRef, AsArray, StringArray, TimestampMicrosecondArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Schema, TimeUnit};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::collections::HashMap;
use std::sync::Arc;

/// Row count is carried explicitly so a batch with no columns survives.
fn rebuild(rows: usize, fields: Vec<Field>, columns: Vec<ArrayRef>) -> LoadResult<RecordBatch> {
    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options).map_err(
        |source| LoadError::Transform {
            column: "*".into(),
            source,
        },
    )
}

/// Rename fields found in `mapping`; everything else passes through.
pub fn rename_columns(
    batch: &RecordBatch,
    mapping: &HashMap<String, String>,
) -> LoadResult<RecordBatch> {
    if mapping.is_empty() {
        return Ok(batch.clone());
    }

    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| match mapping.get(f.name()) {
            Some(new) => f.as_ref().clone().with_name(new.clone()),
            None => f.as_ref().clone(),
        })
        .collect();

    rebuild(batch.num_rows(), fields, batch.columns().to_vec())
}

/// Turn each listed column that exists into `Timestamp(µs)`.
/// Cells that cannot be parsed become null.
pub fn parse_date_columns(batch: &RecordBatch, date_columns: &[String]) -> LoadResult<RecordBatch> {
    if date_columns.is_empty() {
        return Ok(batch.clone());
    }

    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, arr) in schema.fields().iter().zip(batch.columns()) {
        if !date_columns.contains(field.name()) {
            fields.push(field.as_ref().clone());
            columns.push(arr.clone());
            continue;
        }

        // dates/timestamps the reader already typed are rendered back to text
        // so every date column goes through the same parser
        let text = cast(arr, &DataType::Utf8).map_err(|source| LoadError::Transform {
            column: field.name().clone(),
            source,
        })?;
        let parsed: TimestampMicrosecondArray = text
            .as_string::<i32>()
            .iter()
            .map(|opt| opt.and_then(date_parser::parse_timestamp_micros))
            .collect();

        fields.push(Field::new(
            field.name(),
            DataType::Timestamp(TimeUnit::Microsecond, None),
            true,
        ));
        columns.push(Arc::new(parsed) as ArrayRef);
    }

    rebuild(batch.num_rows(), fields, columns)
}

/// NaN floats and sentinel strings become real nulls.
pub fn normalize_missing(batch: &RecordBatch) -> LoadResult<RecordBatch> {
    let mut columns = Vec::with_capacity(batch.num_columns());

    for arr in batch.columns() {
        let out: ArrayRef = match arr.data_type() {
            DataType::Float64 => Arc::new(
                arr.as_primitive::<Float64Type>()
                    .iter()
                    .map(|v| v.filter(|f| !f.is_nan()))
                    .collect::<arrow::array::Float64Array>(),
            ),
            DataType::Float32 => Arc::new(
                arr.as_primitive::<Float32Type>()
                    .iter()
                    .map(|v| v.filter(|f| !f.is_nan()))
                    .collect::<arrow::array::Float32Array>(),
            ),
            DataType::Utf8 => Arc::new(
                arr.as_string::<i32>()
                    .iter()
                    .map(|v| v.filter(|s| !utils::is_missing(s)))
                    .collect::<StringArray>(),
            ),
            _ => arr.clone(),
        };
        columns.push(out);
    }

    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.as_ref().clone().with_nullable(true))
        .collect();
    rebuild(batch.num_rows(), fields, columns)
}

/// Keep only the columns the destination table defines, in dataset order.
pub fn retain_columns(batch: &RecordBatch, destination: &[String]) -> LoadResult<RecordBatch> {
    let keep: Vec<usize> = batch
        .schema()
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| destination.iter().any(|c| c == f.name()))
        .map(|(i, _)| i)
        .collect();

    batch.project(&keep).map_err(|source| LoadError::Transform {
        column: "*".into(),
        source,
    })
}
