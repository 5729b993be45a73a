mod catalog;
mod pool;
mod rows;

use async_trait::async_trait;
use bb8::{Pool, PooledConnection};
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::Query;
use tokio::sync::OnceCell;

use self::pool::TiberiusManager;
use super::Backend;
use crate::connection;
use crate::dialect::Dialect;
use crate::error::StoreError;
use crate::schema::TableRef;
use crate::sql::Statement;
use crate::value::{FieldValue, RowPayload};

/// SQL Server backend. Writes run as single autocommit statements.
pub struct MssqlBackend {
    connection: String,
    pool: OnceCell<Pool<TiberiusManager>>,
}

impl MssqlBackend {
    pub fn new(connection: impl Into<String>) -> Self {
        MssqlBackend {
            connection: connection.into(),
            pool: OnceCell::new(),
        }
    }

    async fn client(&self) -> Result<PooledConnection<'_, TiberiusManager>, StoreError> {
        let pool = self
            .pool
            .get_or_try_init(|| async {
                let config = connection::mssql_config(&self.connection)?;
                tracing::debug!(addr = %config.get_addr(), "Connecting to SQL Server...");
                let pool = Pool::builder()
                    .build(TiberiusManager::new(config))
                    .await?;
                Ok::<_, StoreError>(pool)
            })
            .await?;
        Ok(pool.get().await?)
    }
}

fn prepare(statement: &Statement) -> Query<'_> {
    tracing::debug!(sql = %statement.sql, params = statement.params.len(), "SQL Server statement");
    let mut query = Query::new(statement.sql.as_str());
    for value in &statement.params {
        bind(&mut query, value);
    }
    query
}

fn bind<'a>(query: &mut Query<'a>, value: &'a FieldValue) {
    match value {
        FieldValue::Null => query.bind(Option::<String>::None),
        FieldValue::String(s) => query.bind(s.as_str()),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Decimal(d) => query.bind(numeric(d)),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Date(d) => query.bind(*d),
        FieldValue::DateTime(dt) => query.bind(*dt),
        FieldValue::DateTimeTz(dt) => query.bind(*dt),
        FieldValue::Time(t) => query.bind(*t),
        FieldValue::Uuid(u) => query.bind(*u),
        FieldValue::Bytes(b) => query.bind(b.as_slice()),
        FieldValue::Interval(iv) => query.bind(iv.to_string()),
        FieldValue::Json(v) => query.bind(v.to_string()),
    }
}

/// tiberius binds decimals through its own `Numeric`.
fn numeric(d: &Decimal) -> Numeric {
    Numeric::new_with_scale(d.mantissa(), d.scale() as u8)
}

#[async_trait]
impl Backend for MssqlBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Mssql
    }

    async fn lookup_column_type(
        &self,
        table: &TableRef,
        column: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut client = self.client().await?;
        catalog::query_column_type(&mut *client, table, column).await
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowPayload>, StoreError> {
        let mut client = self.client().await?;
        let rows = prepare(statement)
            .query(&mut *client)
            .await?
            .into_first_result()
            .await?;
        Ok(rows.into_iter().map(rows::decode_row).collect())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let mut client = self.client().await?;
        let result = prepare(statement).execute(&mut *client).await?;
        Ok(result.total())
    }
}
