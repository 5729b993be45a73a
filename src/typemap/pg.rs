use super::TypeFamily;

/// Accepted spellings for `boolean` true values; PostgreSQL also prints `t`.
pub const TRUTHY: &[&str] = &["true", "1", "yes", "si", "t"];

/// Classify a PostgreSQL `information_schema.columns.data_type` value.
///
/// Both the SQL-standard names and the `udt_name` aliases are accepted.
pub fn classify(data_type: &str) -> Option<TypeFamily> {
    match data_type {
        "integer" | "int4" | "bigint" | "int8" | "smallint" | "int2" => Some(TypeFamily::Integer),
        "numeric" | "decimal" | "money" => Some(TypeFamily::Decimal),
        "real" | "float4" | "double precision" | "float8" => Some(TypeFamily::Float),
        "boolean" | "bool" => Some(TypeFamily::Boolean),
        "uuid" => Some(TypeFamily::Uuid),
        "date" => Some(TypeFamily::Date),
        "timestamp without time zone" | "timestamp with time zone" | "timestamp"
        | "timestamptz" => Some(TypeFamily::Timestamp),
        "time" | "time without time zone" => Some(TypeFamily::Time),
        _ => None,
    }
}
