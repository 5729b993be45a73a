pub mod mssql;
pub mod mysql;
pub mod pg;

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::dialect::Dialect;
use crate::sql::{Comparison, KeyFilter};
use crate::value::FieldValue;

/// Target representation for a catalog type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Decimal,
    Float,
    Boolean,
    Uuid,
    Date,
    Timestamp,
    Time,
}

/// Classify a lower-cased catalog type name, dispatching by dialect.
pub fn classify(dialect: Dialect, catalog_type: &str) -> Option<TypeFamily> {
    match dialect {
        Dialect::Mssql => mssql::classify(catalog_type),
        Dialect::Postgres => pg::classify(catalog_type),
        Dialect::Mysql => mysql::classify(catalog_type),
    }
}

fn truthy_tokens(dialect: Dialect) -> &'static [&'static str] {
    match dialect {
        Dialect::Mssql => mssql::TRUTHY,
        Dialect::Postgres => pg::TRUTHY,
        Dialect::Mysql => mysql::TRUTHY,
    }
}

/// Convert request text into the native value for a column of `catalog_type`.
///
/// Unknown types and malformed literals fall back to the raw string.
pub fn coerce(dialect: Dialect, raw: &str, catalog_type: Option<&str>) -> FieldValue {
    let family = catalog_type.and_then(|ty| classify(dialect, &ty.to_lowercase()));
    let Some(family) = family else {
        return FieldValue::String(raw.to_string());
    };
    convert(dialect, family, raw).unwrap_or_else(|| FieldValue::String(raw.to_string()))
}

/// Build the key predicate for a lookup.
///
/// A bare `YYYY-MM-DD` against a timestamp column compares on the date part
/// only, so rows with a non-midnight time still match.
pub fn key_filter(
    dialect: Dialect,
    column: &str,
    raw: &str,
    catalog_type: Option<&str>,
) -> KeyFilter {
    let is_timestamp = catalog_type
        .and_then(|ty| classify(dialect, &ty.to_lowercase()))
        .is_some_and(|family| family == TypeFamily::Timestamp);

    if is_timestamp && is_date_only(raw) {
        let value = parse_date(raw)
            .map(FieldValue::Date)
            .unwrap_or_else(|| FieldValue::String(raw.to_string()));
        return KeyFilter::new(column, Comparison::SameDate, value);
    }

    KeyFilter::new(column, Comparison::Equals, coerce(dialect, raw, catalog_type))
}

/// `YYYY-MM-DD` with no time component.
pub fn is_date_only(raw: &str) -> bool {
    raw.len() == 10 && raw.matches('-').count() == 2 && !raw.contains('T')
}

fn convert(dialect: Dialect, family: TypeFamily, raw: &str) -> Option<FieldValue> {
    let trimmed = raw.trim();
    match family {
        TypeFamily::Integer => trimmed.parse::<i64>().ok().map(FieldValue::Integer),
        TypeFamily::Decimal => Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .ok()
            .map(FieldValue::Decimal),
        TypeFamily::Float => trimmed.parse::<f64>().ok().map(FieldValue::Float),
        TypeFamily::Boolean => {
            let token = trimmed.to_lowercase();
            Some(FieldValue::Boolean(
                truthy_tokens(dialect).contains(&token.as_str()),
            ))
        }
        TypeFamily::Uuid => Uuid::parse_str(trimmed).ok().map(FieldValue::Uuid),
        TypeFamily::Date => parse_date(trimmed).map(FieldValue::Date),
        TypeFamily::Timestamp => parse_timestamp(trimmed),
        TypeFamily::Time => parse_time(trimmed).map(FieldValue::Time),
    }
}

/// Calendar date of an ISO date or date-time string.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.contains('T') {
        return match parse_timestamp(raw)? {
            FieldValue::DateTime(dt) => Some(dt.date()),
            FieldValue::DateTimeTz(dt) => Some(dt.date_naive()),
            _ => None,
        };
    }
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

/// ISO-8601 timestamp; a trailing `Z` is read as `+00:00`.
fn parse_timestamp(raw: &str) -> Option<FieldValue> {
    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    let s = normalized.as_str();

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M%:z"] {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, fmt) {
            return Some(FieldValue::DateTimeTz(dt));
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(FieldValue::DateTime(dt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(FieldValue::DateTime)
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}
