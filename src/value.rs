//! Dynamically typed column values.
//!
//! A [`FieldValue`] is produced either by coercing request input against a
//! column's catalog type or by decoding a native driver value out of a
//! result row. Every backend binds and decodes exactly these variants.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A row keyed by column name, in result-set (or payload) order.
pub type RowPayload = IndexMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    String(String),
    Integer(i64),
    /// Arbitrary-precision decimal (numeric, decimal, money).
    Decimal(Decimal),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    /// Timestamp without offset.
    DateTime(NaiveDateTime),
    /// Timestamp with a UTC offset.
    DateTimeTz(DateTime<FixedOffset>),
    Time(NaiveTime),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    Interval(Interval),
    /// Structured JSON passed through from the request or a json column.
    Json(serde_json::Value),
}

/// A calendar-aware duration, as stored by PostgreSQL `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Whether the value counts as "set" for encryption purposes.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::String(s) => !s.is_empty(),
            FieldValue::Integer(i) => *i != 0,
            FieldValue::Decimal(d) => !d.is_zero(),
            FieldValue::Float(f) => *f != 0.0,
            FieldValue::Boolean(b) => *b,
            FieldValue::Bytes(b) => !b.is_empty(),
            FieldValue::Json(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Array(a) => !a.is_empty(),
                serde_json::Value::Object(o) => !o.is_empty(),
                _ => true,
            },
            _ => true,
        }
    }

    /// Plain text rendering used when a non-string value must be hashed.
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Json(v) => Some(v.to_string()),
            other => match crate::codec::to_transport(other.clone()) {
                FieldValue::String(s) => Some(s),
                FieldValue::Integer(i) => Some(i.to_string()),
                FieldValue::Float(f) => Some(f.to_string()),
                FieldValue::Boolean(b) => Some(b.to_string()),
                _ => None,
            },
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::String(s) => FieldValue::String(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Decimal(Decimal::from(u))
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            other => FieldValue::Json(other),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::String(s) => serializer.serialize_str(s),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(f) => serializer.serialize_f64(*f),
            FieldValue::Boolean(b) => serializer.serialize_bool(*b),
            FieldValue::Json(v) => v.serialize(serializer),
            other => crate::codec::to_transport(other.clone()).serialize(serializer),
        }
    }
}

impl fmt::Display for Interval {
    /// PostgreSQL-style rendering, e.g. `1 year 2 mons 3 days 04:05:06`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn unit(n: i32, singular: &str, plural: &str) -> String {
            if n.abs() == 1 {
                format!("{n} {singular}")
            } else {
                format!("{n} {plural}")
            }
        }

        let mut parts = Vec::new();
        let years = self.months / 12;
        let months = self.months % 12;
        if years != 0 {
            parts.push(unit(years, "year", "years"));
        }
        if months != 0 {
            parts.push(unit(months, "mon", "mons"));
        }
        if self.days != 0 {
            parts.push(unit(self.days, "day", "days"));
        }
        if self.microseconds != 0 || parts.is_empty() {
            let sign = if self.microseconds < 0 { "-" } else { "" };
            let total = self.microseconds.unsigned_abs();
            let micros = total % 1_000_000;
            let secs = total / 1_000_000;
            let mut clock = format!(
                "{sign}{:02}:{:02}:{:02}",
                secs / 3600,
                (secs / 60) % 60,
                secs % 60
            );
            if micros != 0 {
                clock.push_str(&format!(".{micros:06}"));
            }
            parts.push(clock);
        }
        f.write_str(&parts.join(" "))
    }
}
