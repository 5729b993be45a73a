use super::TypeFamily;

pub const TRUTHY: &[&str] = &["true", "1", "yes", "si"];

/// Classify a MySQL/MariaDB `information_schema.columns.DATA_TYPE` value.
pub fn classify(data_type: &str) -> Option<TypeFamily> {
    match data_type {
        "int" | "integer" | "bigint" | "smallint" | "tinyint" | "mediumint" => {
            Some(TypeFamily::Integer)
        }
        "decimal" | "numeric" => Some(TypeFamily::Decimal),
        "float" | "double" | "real" => Some(TypeFamily::Float),
        "bit" | "boolean" | "bool" => Some(TypeFamily::Boolean),
        "date" => Some(TypeFamily::Date),
        "datetime" | "timestamp" => Some(TypeFamily::Timestamp),
        "time" => Some(TypeFamily::Time),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_widths() {
        for ty in ["tinyint", "smallint", "mediumint", "int", "bigint"] {
            assert_eq!(classify(ty), Some(TypeFamily::Integer), "{ty}");
        }
    }

    #[test]
    fn test_temporal() {
        assert_eq!(classify("datetime"), Some(TypeFamily::Timestamp));
        assert_eq!(classify("timestamp"), Some(TypeFamily::Timestamp));
        assert_eq!(classify("date"), Some(TypeFamily::Date));
    }

    #[test]
    fn test_no_uuid_family() {
        // MySQL stores UUIDs in char(36) or binary(16); neither is coerced.
        assert_eq!(classify("char"), None);
        assert_eq!(classify("binary"), None);
    }
}
