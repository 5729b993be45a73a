use crate::dialect::Dialect;
use crate::error::GatewayError;

/// A table addressed by a request, with its schema already resolved for the dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    /// Effective schema. `None` means no qualifier is emitted (MySQL without an explicit schema).
    pub schema: Option<String>,
}

impl TableRef {
    /// Validate the table name and resolve the schema against the dialect default.
    ///
    /// A blank schema counts as absent.
    pub fn resolve(name: &str, schema: Option<&str>, dialect: Dialect) -> Result<Self, GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::invalid("table name must not be empty"));
        }

        let schema = schema
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(dialect.default_schema())
            .map(str::to_string);

        Ok(TableRef {
            name: name.to_string(),
            schema,
        })
    }

    /// Quoted, schema-qualified table name.
    pub fn qualified(&self, dialect: Dialect) -> String {
        match &self.schema {
            Some(schema) => format!(
                "{}.{}",
                dialect.quote_ident(schema),
                dialect.quote_ident(&self.name)
            ),
            None => dialect.quote_ident(&self.name),
        }
    }

    /// Unquoted `schema.table` label for logs and error context.
    pub fn label(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Validate that a required request input is present and not whitespace-only.
pub fn require<'a>(value: &'a str, what: &str) -> Result<&'a str, GatewayError> {
    if value.trim().is_empty() {
        Err(GatewayError::invalid(format!("{what} must not be empty")))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schemas() {
        let t = TableRef::resolve("usuarios", None, Dialect::Mssql).unwrap();
        assert_eq!(t.schema.as_deref(), Some("dbo"));
        assert_eq!(t.qualified(Dialect::Mssql), "[dbo].[usuarios]");

        let t = TableRef::resolve("usuarios", None, Dialect::Postgres).unwrap();
        assert_eq!(t.schema.as_deref(), Some("public"));
        assert_eq!(t.qualified(Dialect::Postgres), "\"public\".\"usuarios\"");

        let t = TableRef::resolve("usuarios", None, Dialect::Mysql).unwrap();
        assert_eq!(t.schema, None);
        assert_eq!(t.qualified(Dialect::Mysql), "`usuarios`");
    }

    #[test]
    fn test_explicit_schema_is_trimmed() {
        let t = TableRef::resolve("orders", Some("  sales "), Dialect::Postgres).unwrap();
        assert_eq!(t.label(), "sales.orders");

        let t = TableRef::resolve("orders", Some("shop"), Dialect::Mysql).unwrap();
        assert_eq!(t.qualified(Dialect::Mysql), "`shop`.`orders`");
    }

    #[test]
    fn test_blank_schema_falls_back_to_default() {
        let t = TableRef::resolve("orders", Some("   "), Dialect::Mssql).unwrap();
        assert_eq!(t.schema.as_deref(), Some("dbo"));
    }

    #[test]
    fn test_blank_table_rejected() {
        for name in ["", "   ", "\t"] {
            let err = TableRef::resolve(name, None, Dialect::Postgres).unwrap_err();
            assert!(matches!(err, GatewayError::InvalidArgument(_)));
        }
    }

    #[test]
    fn test_require() {
        assert_eq!(require("email", "key column").unwrap(), "email");
        assert!(require(" ", "key column").is_err());
    }
}
