use crate::error::GatewayError;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Mssql,
    Postgres,
    Mysql,
}

/// Provider tokens accepted by [`Dialect::from_provider`], in registration order.
pub const PROVIDERS: &[(&str, Dialect)] = &[
    ("sqlserver", Dialect::Mssql),
    ("sqlserverexpress", Dialect::Mssql),
    ("localdb", Dialect::Mssql),
    ("mssql", Dialect::Mssql),
    ("postgres", Dialect::Postgres),
    ("postgresql", Dialect::Postgres),
    ("mysql", Dialect::Mysql),
    ("mariadb", Dialect::Mysql),
];

impl Dialect {
    /// Resolve a configured provider token (case-insensitive) to its dialect.
    pub fn from_provider(token: &str) -> Result<Dialect, GatewayError> {
        let normalized = token.trim().to_lowercase();
        PROVIDERS
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, dialect)| *dialect)
            .ok_or_else(|| GatewayError::UnsupportedProvider {
                provider: token.to_string(),
                valid: PROVIDERS.iter().map(|(name, _)| *name).collect(),
            })
    }

    /// Human-readable name used in error context.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Mssql => "SQL Server",
            Dialect::Postgres => "PostgreSQL",
            Dialect::Mysql => "MySQL/MariaDB",
        }
    }

    /// Return the default schema name for this dialect.
    ///
    /// MySQL has no schema namespace separate from the database, so no
    /// qualifier is emitted unless the caller supplies one.
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Dialect::Mssql => Some("dbo"),
            Dialect::Postgres => Some("public"),
            Dialect::Mysql => None,
        }
    }

    /// Wrap an identifier in the dialect's quote characters.
    ///
    /// An embedded closing quote is doubled; nothing else is escaped.
    pub fn quote_ident(&self, ident: &str) -> String {
        match self {
            Dialect::Mssql => format!("[{}]", ident.replace(']', "]]")),
            Dialect::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
            Dialect::Mysql => format!("`{}`", ident.replace('`', "``")),
        }
    }

    /// Positional parameter marker for the 1-based parameter `n`.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            Dialect::Mssql => format!("@P{n}"),
            Dialect::Postgres => format!("${n}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Expression that truncates a timestamp column to its calendar date.
    pub fn date_cast(&self, quoted_column: &str) -> String {
        match self {
            Dialect::Mssql | Dialect::Postgres => format!("CAST({quoted_column} AS DATE)"),
            Dialect::Mysql => format!("DATE({quoted_column})"),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
