use super::TypeFamily;

/// Accepted spellings for `bit` true values.
pub const TRUTHY: &[&str] = &["true", "1", "yes", "si"];

/// Classify a SQL Server `INFORMATION_SCHEMA.COLUMNS.DATA_TYPE` value.
pub fn classify(data_type: &str) -> Option<TypeFamily> {
    match data_type {
        "int" | "bigint" | "smallint" | "tinyint" => Some(TypeFamily::Integer),
        "decimal" | "numeric" | "money" | "smallmoney" => Some(TypeFamily::Decimal),
        "float" | "real" => Some(TypeFamily::Float),
        "bit" => Some(TypeFamily::Boolean),
        "uniqueidentifier" => Some(TypeFamily::Uuid),
        "date" => Some(TypeFamily::Date),
        "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" => {
            Some(TypeFamily::Timestamp)
        }
        "time" => Some(TypeFamily::Time),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_families() {
        assert_eq!(classify("tinyint"), Some(TypeFamily::Integer));
        assert_eq!(classify("money"), Some(TypeFamily::Decimal));
        assert_eq!(classify("smallmoney"), Some(TypeFamily::Decimal));
        assert_eq!(classify("real"), Some(TypeFamily::Float));
    }

    #[test]
    fn test_temporal_families() {
        assert_eq!(classify("date"), Some(TypeFamily::Date));
        assert_eq!(classify("smalldatetime"), Some(TypeFamily::Timestamp));
        assert_eq!(classify("datetimeoffset"), Some(TypeFamily::Timestamp));
        assert_eq!(classify("time"), Some(TypeFamily::Time));
    }

    #[test]
    fn test_text_types_are_unclassified() {
        assert_eq!(classify("nvarchar"), None);
        assert_eq!(classify("varchar"), None);
        assert_eq!(classify("xml"), None);
    }
}
