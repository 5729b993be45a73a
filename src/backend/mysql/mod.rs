mod catalog;
mod rows;

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool};
use tokio::sync::OnceCell;

use super::Backend;
use crate::connection;
use crate::dialect::Dialect;
use crate::error::StoreError;
use crate::schema::TableRef;
use crate::sql::Statement;
use crate::value::{FieldValue, RowPayload};

/// MySQL and MariaDB share this backend.
pub struct MySqlBackend {
    connection: String,
    pool: OnceCell<MySqlPool>,
}

impl MySqlBackend {
    pub fn new(connection: impl Into<String>) -> Self {
        MySqlBackend {
            connection: connection.into(),
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&MySqlPool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                let url = connection::mysql_url(&self.connection)?;
                let options = MySqlConnectOptions::from_str(&url)?;
                tracing::debug!("Connecting to MySQL/MariaDB...");
                let pool = MySqlPoolOptions::new().connect_with(options).await?;
                Ok::<_, StoreError>(pool)
            })
            .await
    }
}

type MySqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

// UUIDs go over the wire as text (CHAR(36) columns); sqlx would send BINARY(16).
fn bind<'q>(query: MySqlQuery<'q>, value: &'q FieldValue) -> MySqlQuery<'q> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::String(s) => query.bind(s.as_str()),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Decimal(d) => query.bind(*d),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Date(d) => query.bind(*d),
        FieldValue::DateTime(dt) => query.bind(*dt),
        FieldValue::DateTimeTz(dt) => query.bind(dt.with_timezone(&Utc)),
        FieldValue::Time(t) => query.bind(*t),
        FieldValue::Uuid(u) => query.bind(u.hyphenated().to_string()),
        FieldValue::Bytes(b) => query.bind(b.as_slice()),
        FieldValue::Interval(iv) => query.bind(iv.to_string()),
        FieldValue::Json(v) => query.bind(v.to_string()),
    }
}

fn prepare(statement: &Statement) -> MySqlQuery<'_> {
    tracing::debug!(sql = %statement.sql, params = statement.params.len(), "MySQL statement");
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), |query, value| bind(query, value))
}

#[async_trait]
impl Backend for MySqlBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    async fn lookup_column_type(
        &self,
        table: &TableRef,
        column: &str,
    ) -> Result<Option<String>, StoreError> {
        let pool = self.pool().await?;
        catalog::query_column_type(pool, table, column).await
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowPayload>, StoreError> {
        let pool = self.pool().await?;
        let rows = prepare(statement).fetch_all(pool).await?;
        Ok(rows.iter().map(rows::decode_row).collect())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        let result = prepare(statement).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
