//! Per-dialect store access behind a single trait.
//!
//! A backend owns one lazily created pool and knows how to run the catalog
//! lookup, bind [`FieldValue`](crate::value::FieldValue) parameters and decode
//! result rows for its driver. Nothing above this module matches on the
//! dialect to decide how to talk to the store.

pub mod mssql;
pub mod mysql;
pub mod pg;

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialect::Dialect;
use crate::error::{GatewayError, StoreError};
use crate::schema::TableRef;
use crate::sql::Statement;
use crate::value::RowPayload;

#[async_trait]
pub trait Backend: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Declared type of `column` from the store's catalog, `None` when the
    /// table or column is unknown.
    async fn lookup_column_type(
        &self,
        table: &TableRef,
        column: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Best-effort catalog lookup: failures degrade to "type unknown".
    async fn detect_column_type(&self, table: &TableRef, column: &str) -> Option<String> {
        match self.lookup_column_type(table, column).await {
            Ok(found) => found.map(|ty| ty.trim().to_lowercase()),
            Err(e) => {
                tracing::debug!(
                    table = %table.label(),
                    column,
                    error = %e,
                    "Catalog lookup failed, treating column type as unknown"
                );
                None
            }
        }
    }

    /// Run a row-returning statement and decode every row.
    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowPayload>, StoreError>;

    /// Run a write statement and return the affected row count.
    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError>;
}

/// Construct the backend for `dialect`. No connection is opened here.
pub fn for_dialect(dialect: Dialect, connection: impl Into<String>) -> Arc<dyn Backend> {
    let connection = connection.into();
    match dialect {
        Dialect::Mssql => Arc::new(mssql::MssqlBackend::new(connection)),
        Dialect::Postgres => Arc::new(pg::PgBackend::new(connection)),
        Dialect::Mysql => Arc::new(mysql::MySqlBackend::new(connection)),
    }
}

/// Resolve a configured provider token to its backend.
pub fn select_backend(
    provider: &str,
    connection: impl Into<String>,
) -> Result<Arc<dyn Backend>, GatewayError> {
    let dialect = Dialect::from_provider(provider)?;
    tracing::info!(provider, %dialect, "Selected backend");
    Ok(for_dialect(dialect, connection))
}
