use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tiberius::{ColumnData, FromSql, Row};

use crate::value::{FieldValue, RowPayload};

pub fn decode_row(row: Row) -> RowPayload {
    let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
    names
        .into_iter()
        .zip(row.into_iter())
        .map(|(name, data)| {
            let value = decode_cell(&data).unwrap_or_else(|e| {
                tracing::warn!(column = %name, error = %e, "Undecodable SQL Server value");
                FieldValue::Null
            });
            (name, value)
        })
        .collect()
}

fn decode_cell(data: &ColumnData<'static>) -> tiberius::Result<FieldValue> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| FieldValue::Integer(v.into())),
        ColumnData::I16(v) => v.map(|v| FieldValue::Integer(v.into())),
        ColumnData::I32(v) => v.map(|v| FieldValue::Integer(v.into())),
        ColumnData::I64(v) => v.map(FieldValue::Integer),
        ColumnData::F32(v) => v.map(|v| FieldValue::Float(v.into())),
        ColumnData::F64(v) => v.map(FieldValue::Float),
        ColumnData::Bit(v) => v.map(FieldValue::Boolean),
        ColumnData::String(v) => v.as_ref().map(|s| FieldValue::String(s.to_string())),
        ColumnData::Guid(v) => v.map(FieldValue::Uuid),
        ColumnData::Binary(v) => v.as_ref().map(|b| FieldValue::Bytes(b.to_vec())),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| FieldValue::String(x.clone().into_owned().into_string())),
        ColumnData::Numeric(_) => Decimal::from_sql(data)?.map(FieldValue::Decimal),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?.map(FieldValue::DateTime)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)?.map(FieldValue::Date),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?.map(FieldValue::Time),
        ColumnData::DateTimeOffset(_) => {
            DateTime::<FixedOffset>::from_sql(data)?.map(FieldValue::DateTimeTz)
        }
    };
    Ok(value.unwrap_or(FieldValue::Null))
}
