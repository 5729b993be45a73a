use tiberius::Query;

use super::pool::MssqlClient;
use crate::dialect::Dialect;
use crate::error::StoreError;
use crate::schema::TableRef;

pub async fn query_column_type(
    client: &mut MssqlClient,
    table: &TableRef,
    column: &str,
) -> Result<Option<String>, StoreError> {
    let schema = table
        .schema
        .as_deref()
        .or(Dialect::Mssql.default_schema())
        .unwrap_or_default();

    let mut query = Query::new(
        "SELECT TOP (1) DATA_TYPE FROM INFORMATION_SCHEMA.COLUMNS \
         WHERE TABLE_SCHEMA = @P1 AND TABLE_NAME = @P2 AND COLUMN_NAME = @P3",
    );
    query.bind(schema);
    query.bind(table.name.as_str());
    query.bind(column);

    let row = query.query(client).await?.into_row().await?;
    Ok(row.and_then(|r| r.get::<&str, _>(0).map(str::to_lowercase)))
}
