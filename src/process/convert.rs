use crate::error::{LoadError, LoadResult};
use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Field, Float64Type, Int32Type, Int64Type, Schema, TimeUnit,
    TimestampMicrosecondType,
};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use duckdb::types::{TimeUnit as DuckTimeUnit, Value};
use std::sync::Arc;

/// Arrow type each column is brought to before binding.
fn bind_type(dt: &DataType) -> DataType {
    match dt {
        DataType::Null | DataType::Boolean | DataType::Utf8 | DataType::Date32 => dt.clone(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 => DataType::Int32,
        DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => DataType::Int64,
        DataType::Float16 | DataType::Float32 | DataType::Float64 => DataType::Float64,
        DataType::Date64 | DataType::Timestamp(_, _) => {
            DataType::Timestamp(TimeUnit::Microsecond, None)
        }
        _ => DataType::Utf8,
    }
}

/// Cast every column to one of the handful of types `cell_value` binds.
pub fn prepare_for_write(batch: &RecordBatch) -> LoadResult<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut columns = Vec::with_capacity(batch.num_columns());

    for (field, arr) in schema.fields().iter().zip(batch.columns()) {
        let target = bind_type(field.data_type());
        if &target == field.data_type() {
            fields.push(field.as_ref().clone());
            columns.push(arr.clone());
            continue;
        }
        let casted = cast(arr, &target).map_err(|source| LoadError::Transform {
            column: field.name().clone(),
            source,
        })?;
        fields.push(Field::new(field.name(), target, true));
        columns.push(casted);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options).map_err(
        |source| LoadError::Transform {
            column: "*".into(),
            source,
        },
    )
}

/// One cell as a DuckDB bind value. Expects a batch from `prepare_for_write`.
pub fn cell_value(arr: &dyn Array, row: usize) -> duckdb::Result<Value> {
    if arr.data_type() == &DataType::Null || arr.is_null(row) {
        return Ok(Value::Null);
    }
    let v = match arr.data_type() {
        DataType::Boolean => Value::Boolean(arr.as_boolean().value(row)),
        DataType::Int32 => Value::Int(arr.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => Value::BigInt(arr.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => Value::Double(arr.as_primitive::<Float64Type>().value(row)),
        DataType::Utf8 => Value::Text(arr.as_string::<i32>().value(row).to_string()),
        DataType::Date32 => Value::Date32(arr.as_primitive::<Date32Type>().value(row)),
        DataType::Timestamp(TimeUnit::Microsecond, _) => Value::Timestamp(
            DuckTimeUnit::Microsecond,
            arr.as_primitive::<TimestampMicrosecondType>().value(row),
        ),
        other => {
            return Err(duckdb::Error::ToSqlConversionFailure(
                format!("unsupported column type {other}").into(),
            ))
        }
    };
    Ok(v)
}

/// Row-major bind values for rows `[start, start + len)`.
pub fn row_values(batch: &RecordBatch, start: usize, len: usize) -> duckdb::Result<Vec<Value>> {
    let mut out = Vec::with_capacity(len * batch.num_columns());
    for row in start..start + len {
        for col in batch.columns() {
            out.push(cell_value(col.as_ref(), row)?);
        }
    }
    Ok(out)
}
