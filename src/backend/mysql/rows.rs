use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::value::{FieldValue, RowPayload};

pub fn decode_row(row: &MySqlRow) -> RowPayload {
    row.columns()
        .iter()
        .map(|col| {
            let value = decode_cell(row, col.ordinal(), col.type_info().name());
            (col.name().to_string(), value)
        })
        .collect()
}

fn decode_cell(row: &MySqlRow, idx: usize, type_name: &str) -> FieldValue {
    let is_null = row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true);
    if is_null {
        return FieldValue::Null;
    }

    let decoded = match type_name {
        // TINYINT(1)
        "BOOLEAN" => row.try_get::<bool, _>(idx).map(FieldValue::Boolean),
        "DECIMAL" => row.try_get::<Decimal, _>(idx).map(FieldValue::Decimal),
        "FLOAT" => row.try_get::<f32, _>(idx).map(|v| FieldValue::Float(v.into())),
        "DOUBLE" => row.try_get::<f64, _>(idx).map(FieldValue::Float),
        "DATE" => row.try_get::<NaiveDate, _>(idx).map(FieldValue::Date),
        "DATETIME" | "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(idx).map(FieldValue::DateTime),
        "TIME" => row.try_get::<NaiveTime, _>(idx).map(FieldValue::Time),
        "JSON" => row.try_get::<serde_json::Value, _>(idx).map(FieldValue::Json),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            row.try_get::<Vec<u8>, _>(idx).map(FieldValue::Bytes)
        }
        name if name.contains("INT") || name == "BIT" || name == "YEAR" => integer(row, idx),
        _ => row.try_get::<String, _>(idx).map(FieldValue::String),
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!(column = idx, type_name, error = %e, "Undecodable MySQL value");
        row.try_get_unchecked::<String, _>(idx)
            .map(FieldValue::String)
            .unwrap_or(FieldValue::Null)
    })
}

/// Signed first, then unsigned; unsigned values beyond `i64` become decimals.
fn integer(row: &MySqlRow, idx: usize) -> Result<FieldValue, sqlx::Error> {
    row.try_get::<i64, _>(idx)
        .map(FieldValue::Integer)
        .or_else(|_| {
            row.try_get::<u64, _>(idx).map(|u| match i64::try_from(u) {
                Ok(i) => FieldValue::Integer(i),
                Err(_) => FieldValue::Decimal(Decimal::from(u)),
            })
        })
}
