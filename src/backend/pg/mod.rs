mod catalog;
mod rows;

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPoolOptions};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use tokio::sync::OnceCell;

use super::Backend;
use crate::connection;
use crate::dialect::Dialect;
use crate::error::StoreError;
use crate::schema::TableRef;
use crate::sql::Statement;
use crate::value::{FieldValue, RowPayload};

pub struct PgBackend {
    connection: String,
    pool: OnceCell<PgPool>,
}

impl PgBackend {
    pub fn new(connection: impl Into<String>) -> Self {
        PgBackend {
            connection: connection.into(),
            pool: OnceCell::new(),
        }
    }

    async fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool
            .get_or_try_init(|| async {
                let url = connection::postgres_url(&self.connection)?;
                let options = PgConnectOptions::from_str(&url)?;
                tracing::debug!("Connecting to PostgreSQL...");
                let pool = PgPoolOptions::new().connect_with(options).await?;
                Ok::<_, StoreError>(pool)
            })
            .await
    }
}

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

fn bind<'q>(query: PgQuery<'q>, value: &'q FieldValue) -> PgQuery<'q> {
    match value {
        FieldValue::Null => query.bind(None::<String>),
        FieldValue::String(s) => query.bind(s.as_str()),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Decimal(d) => query.bind(*d),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Date(d) => query.bind(*d),
        FieldValue::DateTime(dt) => query.bind(*dt),
        FieldValue::DateTimeTz(dt) => query.bind(*dt),
        FieldValue::Time(t) => query.bind(*t),
        FieldValue::Uuid(u) => query.bind(*u),
        FieldValue::Bytes(b) => query.bind(b.as_slice()),
        FieldValue::Interval(iv) => query.bind(PgInterval {
            months: iv.months,
            days: iv.days,
            microseconds: iv.microseconds,
        }),
        FieldValue::Json(v) => query.bind(Json(v)),
    }
}

fn prepare(statement: &Statement) -> PgQuery<'_> {
    tracing::debug!(sql = %statement.sql, params = statement.params.len(), "PostgreSQL statement");
    statement
        .params
        .iter()
        .fold(sqlx::query(&statement.sql), |query, value| bind(query, value))
}

#[async_trait]
impl Backend for PgBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
