//! Decoding of rows whose shape is only known at runtime.
//!
//! Cells are decoded by the wire type PostgreSQL reports for each column,
//! which is the stored column type. A type outside the registry's mapping is
//! an inconsistency, reported rather than coerced.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tabula_core::{CellValue, Row, StorageError};
use tokio_postgres::types::{FromSql, Type};

use crate::error::{ApiError, ApiResult};

fn get<'a, T>(row: &'a tokio_postgres::Row, idx: usize, column: &str) -> ApiResult<Option<T>>
where
    T: FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx).map_err(|e| {
        ApiError::storage_error(format!("Failed to decode column '{}': {}", column, e))
    })
}

fn decode_cell(
    table: &str,
    row: &tokio_postgres::Row,
    idx: usize,
    column: &str,
    ty: &Type,
) -> ApiResult<CellValue> {
    let cell = match *ty {
        Type::INT8 => get::<i64>(row, idx, column)?.map(CellValue::Integer),
        Type::INT4 => get::<i32>(row, idx, column)?.map(|v| CellValue::Integer(v.into())),
        Type::INT2 => get::<i16>(row, idx, column)?.map(|v| CellValue::Integer(v.into())),
        Type::FLOAT8 => get::<f64>(row, idx, column)?.map(CellValue::Real),
        Type::FLOAT4 => get::<f32>(row, idx, column)?.map(|v| CellValue::Real(v.into())),
        Type::BOOL => get::<bool>(row, idx, column)?.map(CellValue::Boolean),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx, column)?.map(CellValue::Text)
        }
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx, column)?.map(CellValue::Timestamp),
        Type::JSON | Type::JSONB => get::<JsonValue>(row, idx, column)?.map(CellValue::Json),
        _ => {
            return Err(StorageError::UnmappedNativeType {
                table: table.to_string(),
                column: column.to_string(),
                native: ty.name().to_string(),
            }
            .into())
        }
    };
    Ok(cell.unwrap_or(CellValue::Null))
}

/// Decode every column of a `SELECT *` / `RETURNING *` row, in table order.
pub(crate) fn decode_row(table: &str, row: &tokio_postgres::Row) -> ApiResult<Row> {
    let mut decoded = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let cell = decode_cell(table, row, idx, column.name(), column.type_())?;
        decoded.insert(column.name(), cell);
    }
    Ok(decoded)
}

pub(crate) fn decode_rows(table: &str, rows: &[tokio_postgres::Row]) -> ApiResult<Vec<Row>> {
    rows.iter().map(|row| decode_row(table, row)).collect()
}
