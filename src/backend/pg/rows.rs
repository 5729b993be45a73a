use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::types::{PgInterval, PgMoney};
use sqlx::postgres::PgRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use uuid::Uuid;

use crate::value::{FieldValue, Interval, RowPayload};

/// Decode a result row, keyed by column name in result-set order.
pub fn decode_row(row: &PgRow) -> RowPayload {
    row.columns()
        .iter()
        .map(|col| {
            let value = decode_cell(row, col.ordinal(), col.type_info().name());
            (col.name().to_string(), value)
        })
        .collect()
}

fn decode_cell(row: &PgRow, idx: usize, type_name: &str) -> FieldValue {
    let is_null = row.try_get_raw(idx).map(|v| v.is_null()).unwrap_or(true);
    if is_null {
        return FieldValue::Null;
    }

    let decoded = match type_name {
        "BOOL" => row.try_get::<bool, _>(idx).map(FieldValue::Boolean),
        "INT2" => row.try_get::<i16, _>(idx).map(|v| FieldValue::Integer(v.into())),
        "INT4" => row.try_get::<i32, _>(idx).map(|v| FieldValue::Integer(v.into())),
        "INT8" => row.try_get::<i64, _>(idx).map(FieldValue::Integer),
        "FLOAT4" => row.try_get::<f32, _>(idx).map(|v| FieldValue::Float(v.into())),
        "FLOAT8" => row.try_get::<f64, _>(idx).map(FieldValue::Float),
        "NUMERIC" => row.try_get::<Decimal, _>(idx).map(FieldValue::Decimal),
        "MONEY" => row
            .try_get::<PgMoney, _>(idx)
            .map(|m| FieldValue::Decimal(m.to_decimal(2))),
        "DATE" => row.try_get::<NaiveDate, _>(idx).map(FieldValue::Date),
        "TIMESTAMP" => row.try_get::<NaiveDateTime, _>(idx).map(FieldValue::DateTime),
        "TIMESTAMPTZ" => row
            .try_get::<DateTime<Utc>, _>(idx)
            .map(|dt| FieldValue::DateTimeTz(dt.fixed_offset())),
        "TIME" => row.try_get::<NaiveTime, _>(idx).map(FieldValue::Time),
        "UUID" => row.try_get::<Uuid, _>(idx).map(FieldValue::Uuid),
        "BYTEA" => row.try_get::<Vec<u8>, _>(idx).map(FieldValue::Bytes),
        "INTERVAL" => row.try_get::<PgInterval, _>(idx).map(|iv| {
            FieldValue::Interval(Interval {
                months: iv.months,
                days: iv.days,
                microseconds: iv.microseconds,
            })
        }),
        "JSON" | "JSONB" => row
            .try_get::<serde_json::Value, _>(idx)
            .map(FieldValue::Json),
        _ => row.try_get_unchecked::<String, _>(idx).map(FieldValue::String),
    };

    decoded.unwrap_or_else(|e| {
        tracing::warn!(column = idx, type_name, error = %e, "Undecodable PostgreSQL value");
        row.try_get_unchecked::<String, _>(idx)
            .map(FieldValue::String)
            .unwrap_or(FieldValue::Null)
    })
}
