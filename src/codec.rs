//! Row codec: native values out, transport-safe values in.
//!
//! The transport-safe subset is {null, string, integer, float, boolean, json}.
//! Temporal values become ISO-8601 strings, decimals become floats, UUIDs
//! and intervals become their canonical text, bytes become lossy UTF-8.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::value::{FieldValue, RowPayload};

pub fn to_transport(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Date(d) => FieldValue::String(d.format("%Y-%m-%d").to_string()),
        FieldValue::DateTime(dt) => FieldValue::String(iso_datetime(&dt)),
        FieldValue::DateTimeTz(dt) => FieldValue::String(format!(
            "{}{}",
            iso_datetime(&dt.naive_local()),
            dt.format("%:z")
        )),
        FieldValue::Time(t) => FieldValue::String(iso_time(&t)),
        FieldValue::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => FieldValue::Float(f),
            Err(_) => FieldValue::String(d.to_string()),
        },
        FieldValue::Uuid(u) => FieldValue::String(u.hyphenated().to_string()),
        FieldValue::Bytes(b) => FieldValue::String(String::from_utf8_lossy(&b).into_owned()),
        FieldValue::Interval(iv) => FieldValue::String(iv.to_string()),
        safe => safe,
    }
}

/// Normalize every cell of a decoded row.
pub fn normalize_row(row: RowPayload) -> RowPayload {
    row.into_iter()
        .map(|(column, value)| (column, to_transport(value)))
        .collect()
}

fn iso_datetime(dt: &NaiveDateTime) -> String {
    if dt.nanosecond() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn iso_time(t: &NaiveTime) -> String {
    if t.nanosecond() == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M:%S%.6f").to_string()
    }
}
