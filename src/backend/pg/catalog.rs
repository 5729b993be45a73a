use sqlx::PgPool;

use crate::error::StoreError;
use crate::schema::TableRef;

pub async fn query_column_type(
    pool: &PgPool,
    table: &TableRef,
    column: &str,
) -> Result<Option<String>, StoreError> {
    let row: Option<(String,)> = sqlx::query_as(
        r#"
        SELECT c.data_type::text
        FROM information_schema.columns c
        WHERE c.table_schema = COALESCE($1, current_schema())
          AND c.table_name = $2
          AND c.column_name = $3
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
