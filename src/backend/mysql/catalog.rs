use sqlx::MySqlPool;

use crate::error::StoreError;
use crate::schema::TableRef;

/// Without an explicit schema the lookup is scoped to the connection's
/// current database.
pub async fn query_column_type(
    pool: &MySqlPool,
    table: &TableRef,
    column: &str,
) -> Result<Option<String>, StoreError> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT CAST(DATA_TYPE AS CHAR)
        FROM information_schema.COLUMNS
        WHERE TABLE_SCHEMA = COALESCE(?, DATABASE())
          AND TABLE_NAME = ?
          AND COLUMN_NAME = ?
        LIMIT 1
        "#,
    )
    .bind(table.schema.as_deref())
    .bind(&table.name)
    .bind(column)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(data_type,)| data_type.to_lowercase()))
}
