//! Dialect-agnostic CRUD over any table.
//!
//! Each operation validates its inputs before any I/O, asks the backend for
//! catalog types where string input has to be coerced, builds the statement
//! and normalizes the result rows. The whole operation runs under one
//! deadline.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::Backend;
use crate::codec;
use crate::dialect::Dialect;
use crate::error::{GatewayError, StoreError};
use crate::hashing::{self, EncryptionDirective};
use crate::schema::{require, TableRef};
use crate::sql::{KeyFilter, SqlBuilder, Statement, DEFAULT_LIMIT};
use crate::typemap;
use crate::value::{FieldValue, RowPayload};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of [`Gateway::verify_password`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialCheck {
    /// No row matched the user value, or its stored hash is empty.
    NotFound,
    Invalid,
    Valid,
}

impl CredentialCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialCheck::NotFound => "not_found",
            CredentialCheck::Invalid => "invalid",
            CredentialCheck::Valid => "valid",
        }
    }
}

pub struct Gateway {
    backend: Arc<dyn Backend>,
    builder: SqlBuilder,
    timeout: Duration,
    hash_cost: u32,
}

impl Gateway {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let builder = SqlBuilder::new(backend.dialect());
        Gateway {
            backend,
            builder,
            timeout: DEFAULT_TIMEOUT,
            hash_cost: hashing::DEFAULT_COST,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.backend.dialect()
    }

    /// Resolve the table reference the way every operation does.
    pub fn table(&self, name: &str, schema: Option<&str>) -> Result<TableRef, GatewayError> {
        TableRef::resolve(name, schema, self.dialect())
    }

    /// First `limit` rows of the table; a missing or non-positive limit means 1000.
    pub async fn list(
        &self,
        table: &str,
        schema: Option<&str>,
        limit: Option<i64>,
    ) -> Result<Vec<RowPayload>, GatewayError> {
        let table = self.table(table, schema)?;
        let limit = limit
            .and_then(|l| u64::try_from(l).ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT);

        self.bounded("list", &table, async {
            let statement = self.builder.list(&table, limit);
            self.fetch("list", &table, &statement).await
        })
        .await
    }

    /// Rows whose `key_column` matches `key_value`; empty when nothing matches.
    pub async fn get_by_key(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        schema: Option<&str>,
    ) -> Result<Vec<RowPayload>, GatewayError> {
        let table = self.table(table, schema)?;
        require(key_column, "key column")?;
        require(key_value, "key value")?;

        self.bounded("get_by_key", &table, async {
            let filter = self.key_filter(&table, key_column, key_value).await;
            let statement = self.builder.select_where(&table, &filter);
            self.fetch("get_by_key", &table, &statement).await
        })
        .await
    }

    /// Insert one row. Returns whether at least one row was inserted.
    pub async fn create(
        &self,
        table: &str,
        payload: RowPayload,
        schema: Option<&str>,
        encrypt_fields: Option<&str>,
    ) -> Result<bool, GatewayError> {
        let table = self.table(table, schema)?;
        if payload.is_empty() {
            return Err(GatewayError::invalid("payload must not be empty"));
        }
        let directive = EncryptionDirective::parse(encrypt_fields)?;

        self.bounded("create", &table, async {
            let payload = self.prepare_payload(&table, payload, &directive).await?;
            let statement = self.builder.insert(&table, &payload);
            let affected = self.execute("create", &table, &statement).await?;
            Ok(affected > 0)
        })
        .await
    }

    /// Update rows matching the key. Zero affected rows is not an error.
    pub async fn update(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        payload: RowPayload,
        schema: Option<&str>,
        encrypt_fields: Option<&str>,
    ) -> Result<u64, GatewayError> {
        let table = self.table(table, schema)?;
        require(key_column, "key column")?;
        require(key_value, "key value")?;
        if payload.is_empty() {
            return Err(GatewayError::invalid("payload must not be empty"));
        }
        let directive = EncryptionDirective::parse(encrypt_fields)?;

        self.bounded("update", &table, async {
            let payload = self.prepare_payload(&table, payload, &directive).await?;
            let filter = self.exact_key(&table, key_column, key_value).await;
            let statement = self.builder.update(&table, &payload, &filter);
            self.execute("update", &table, &statement).await
        })
        .await
    }

    /// Delete rows matching the key. Zero affected rows is not an error.
    pub async fn delete(
        &self,
        table: &str,
        key_column: &str,
        key_value: &str,
        schema: Option<&str>,
    ) -> Result<u64, GatewayError> {
        let table = self.table(table, schema)?;
        require(key_column, "key column")?;
        require(key_value, "key value")?;

        self.bounded("delete", &table, async {
            let filter = self.exact_key(&table, key_column, key_value).await;
            let statement = self.builder.delete(&table, &filter);
            self.execute("delete", &table, &statement).await
        })
        .await
    }

    /// Check `password` against the hash stored for the row whose
    /// `user_column` equals `user_value`.
    pub async fn verify_password(
        &self,
        table: &str,
        user_column: &str,
        user_value: &str,
        password_column: &str,
        password: &str,
        schema: Option<&str>,
    ) -> Result<CredentialCheck, GatewayError> {
        let table = self.table(table, schema)?;
        require(user_column, "user column")?;
        require(password_column, "password column")?;
        require(user_value, "user value")?;
        require(password, "password")?;

        self.bounded("verify_password", &table, async {
            let filter = self.exact_key(&table, user_column, user_value).await;
            let statement = self
                .builder
                .select_single_column(&table, password_column, &filter);
            let rows = self.fetch("verify_password", &table, &statement).await?;

            let stored = rows
                .into_iter()
                .next()
                .and_then(|row| row.into_iter().next())
                .and_then(|(_, value)| value.to_plain_string())
                .filter(|hash| !hash.trim().is_empty());
            let Some(stored) = stored else {
                return Ok(CredentialCheck::NotFound);
            };

            let password = password.to_string();
            let matches = tokio::task::spawn_blocking(move || hashing::verify(&password, &stored))
                .await
                .map_err(|e| GatewayError::Hash(e.to_string()))?;

            Ok(if matches {
                CredentialCheck::Valid
            } else {
                CredentialCheck::Invalid
            })
        })
        .await
    }

    async fn key_filter(&self, table: &TableRef, column: &str, raw: &str) -> KeyFilter {
        let catalog_type = self.backend.detect_column_type(table, column).await;
        typemap::key_filter(self.dialect(), column, raw, catalog_type.as_deref())
    }

    /// Plain equality on the coerced key. Writes never widen to a whole day.
    async fn exact_key(&self, table: &TableRef, column: &str, raw: &str) -> KeyFilter {
        let catalog_type = self.backend.detect_column_type(table, column).await;
        KeyFilter::equals(column, typemap::coerce(self.dialect(), raw, catalog_type.as_deref()))
    }

    /// Hash directive fields, then coerce the remaining string values
    /// against their catalog types. Non-string values pass through.
    async fn prepare_payload(
        &self,
        table: &TableRef,
        payload: RowPayload,
        directive: &EncryptionDirective,
    ) -> Result<RowPayload, GatewayError> {
        for field in directive.fields() {
            if !payload.keys().any(|k| k.to_lowercase() == field) {
                tracing::warn!(field, table = %table.label(), "Encrypt directive names a field missing from the payload");
            }
        }

        let mut prepared = RowPayload::with_capacity(payload.len());
        for (column, value) in payload {
            let value = if directive.covers(&column) && value.is_truthy() {
                self.hash_value(&column, &value).await?
            } else if let FieldValue::String(raw) = &value {
                let catalog_type = self.backend.detect_column_type(table, &column).await;
                typemap::coerce(self.dialect(), raw, catalog_type.as_deref())
            } else {
                value
            };
            prepared.insert(column, value);
        }
        Ok(prepared)
    }

    async fn hash_value(&self, column: &str, value: &FieldValue) -> Result<FieldValue, GatewayError> {
        let plaintext = value.to_plain_string().ok_or_else(|| {
            GatewayError::invalid(format!("field '{column}' cannot be hashed"))
        })?;
        let cost = self.hash_cost;
        let hashed = tokio::task::spawn_blocking(move || hashing::hash(&plaintext, cost))
            .await
            .map_err(|e| GatewayError::Hash(e.to_string()))??;
        Ok(FieldValue::String(hashed))
    }

    async fn fetch(
        &self,
        operation: &'static str,
        table: &TableRef,
        statement: &Statement,
    ) -> Result<Vec<RowPayload>, GatewayError> {
        let rows = self
            .backend
            .fetch(statement)
            .await
            .map_err(|e| self.store_error(operation, table, e))?;
        Ok(rows.into_iter().map(codec::normalize_row).collect())
    }

    async fn execute(
        &self,
        operation: &'static str,
        table: &TableRef,
        statement: &Statement,
    ) -> Result<u64, GatewayError> {
        self.backend
            .execute(statement)
            .await
            .map_err(|e| self.store_error(operation, table, e))
    }

    fn store_error(&self, operation: &'static str, table: &TableRef, source: StoreError) -> GatewayError {
        GatewayError::from_store(self.dialect(), operation, table.label(), source)
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        table: &TableRef,
        work: impl Future<Output = Result<T, GatewayError>>,
    ) -> Result<T, GatewayError> {
        tracing::debug!(operation, table = %table.label(), "Running operation");
        tokio::time::timeout(self.timeout, work)
            .await
            .map_err(|_| GatewayError::Timeout {
                operation,
                context: table.label(),
                after: self.timeout,
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use crate::sql::Comparison;
    use crate::testutil::{row, RecordingBackend};
    use chrono::NaiveDate;

    fn gateway(backend: RecordingBackend) -> (Gateway, Arc<RecordingBackend>) {
        let backend = Arc::new(backend);
        let gw = Gateway::new(backend.clone()).with_hash_cost(hashing::MIN_COST);
        (gw, backend)
    }

    fn usuario() -> RowPayload {
        row([
            ("email", FieldValue::String("a@b.com".into())),
            ("edad", FieldValue::String("30".into())),
        ])
    }

    #[tokio::test]
    async fn test_create_binds_integer_for_int_column() {
        let (gw, backend) = gateway(
            RecordingBackend::new(Dialect::Mssql)
                .with_column("email", "nvarchar")
                .with_column("edad", "int"),
        );
        assert!(gw.create("usuarios", usuario(), None, None).await.unwrap());

        let statement = backend.last_statement();
        insta::assert_snapshot!(statement.sql, @"INSERT INTO [dbo].[usuarios] ([email], [edad]) VALUES (@P1, @P2)");
        assert_eq!(
            statement.params,
            vec![FieldValue::String("a@b.com".into()), FieldValue::Integer(30)]
        );
    }

    #[tokio::test]
    async fn test_create_reports_no_rows_inserted() {
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Postgres).with_affected(0));
        assert!(!gw.create("usuarios", usuario(), None, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_non_string_payload_values_skip_catalog() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Postgres));
        let payload = row([
            ("edad", FieldValue::Integer(30)),
            ("activo", FieldValue::Boolean(true)),
        ]);
        gw.create("usuarios", payload, None, None).await.unwrap();
        assert!(backend.lookups().is_empty());
        assert_eq!(
            backend.last_statement().params,
            vec![FieldValue::Integer(30), FieldValue::Boolean(true)]
        );
    }

    #[tokio::test]
    async fn test_catalog_failure_sends_raw_string() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Mysql).failing_catalog());
        assert!(gw.create("usuarios", usuario(), None, None).await.unwrap());
        assert_eq!(
            backend.last_statement().params[1],
            FieldValue::String("30".into())
        );
    }

    #[tokio::test]
    async fn test_encrypted_field_never_stores_plaintext() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Postgres));
        let payload = row([
            ("email", FieldValue::String("a@b.com".into())),
            ("Contrasena", FieldValue::String("s3cret".into())),
        ]);
        gw.create("usuarios", payload, None, Some("CONTRASENA"))
            .await
            .unwrap();

        let params = backend.last_statement().params;
        let FieldValue::String(stored) = &params[1] else {
            panic!("expected hashed string, got {:?}", params[1]);
        };
        assert_ne!(stored, "s3cret");
        assert!(hashing::verify("s3cret", stored));
        assert_eq!(params[0], FieldValue::String("a@b.com".into()));
    }

    #[tokio::test]
    async fn test_encryption_skips_empty_values() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Postgres));
        let payload = row([
            ("email", FieldValue::String("a@b.com".into())),
            ("pin", FieldValue::String(String::new())),
        ]);
        gw.create("usuarios", payload, None, Some("pin")).await.unwrap();
        assert_eq!(
            backend.last_statement().params[1],
            FieldValue::String(String::new())
        );
    }

    #[tokio::test]
    async fn test_update_encrypts_and_coerces_key() {
        let (gw, backend) = gateway(
            RecordingBackend::new(Dialect::Postgres).with_column("id", "integer"),
        );
        let payload = row([("contrasena", FieldValue::String("nueva".into()))]);
        let affected = gw
            .update("usuarios", "id", "9", payload, None, Some("contrasena"))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let statement = backend.last_statement();
        insta::assert_snapshot!(statement.sql, @r#"UPDATE "public"."usuarios" SET "contrasena" = $1 WHERE "id" = $2"#);
        let FieldValue::String(stored) = &statement.params[0] else {
            panic!("expected hash");
        };
        assert!(hashing::verify("nueva", stored));
        assert_eq!(statement.params[1], FieldValue::Integer(9));
    }

    #[tokio::test]
    async fn test_update_and_delete_without_match_return_zero() {
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Mysql).with_affected(0));
        let payload = row([("email", FieldValue::String("x@y.com".into()))]);
        assert_eq!(
            gw.update("usuarios", "id", "404", payload, None, None)
                .await
                .unwrap(),
            0
        );
        assert_eq!(gw.delete("usuarios", "id", "404", None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_date_on_timestamp_use_equality() {
        let (gw, backend) = gateway(
            RecordingBackend::new(Dialect::Postgres)
                .with_column("creado", "timestamp without time zone"),
        );
        let payload = row([("estado", FieldValue::String("enviado".into()))]);
        gw.update("pedidos", "creado", "2024-01-15", payload, None, None)
            .await
            .unwrap();
        gw.delete("pedidos", "creado", "2024-01-15", None)
            .await
            .unwrap();

        let statements = backend.statements();
        insta::assert_snapshot!(statements[0].sql, @r#"UPDATE "public"."pedidos" SET "estado" = $1 WHERE "creado" = $2"#);
        insta::assert_snapshot!(statements[1].sql, @r#"DELETE FROM "public"."pedidos" WHERE "creado" = $1"#);
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(statements[0].params[1], FieldValue::DateTime(midnight));
        assert_eq!(statements[1].params, vec![FieldValue::DateTime(midnight)]);
        for statement in &statements {
            assert!(!statement.sql.contains("CAST("), "{}", statement.sql);
            assert!(!statement.sql.contains("DATE("), "{}", statement.sql);
        }
    }

    #[tokio::test]
    async fn test_verify_password_lookup_by_date_uses_equality() {
        let (gw, backend) = gateway(
            RecordingBackend::new(Dialect::Mysql).with_column("alta", "datetime"),
        );
        let check = gw
            .verify_password("usuarios", "alta", "2024-01-15", "contrasena", "s3cret", None)
            .await
            .unwrap();
        assert_eq!(check, CredentialCheck::NotFound);
        insta::assert_snapshot!(backend.last_statement().sql, @"SELECT `contrasena` FROM `usuarios` WHERE `alta` = ? LIMIT 1");
    }

    #[tokio::test]
    async fn test_get_without_match_is_empty() {
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Mssql));
        let rows = gw.get_by_key("usuarios", "id", "404", None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_get_by_date_on_timestamp_truncates() {
        let (gw, backend) = gateway(
            RecordingBackend::new(Dialect::Mysql).with_column("creado", "datetime"),
        );
        gw.get_by_key("pedidos", "creado", "2024-01-15", None)
            .await
            .unwrap();
        let statement = backend.last_statement();
        insta::assert_snapshot!(statement.sql, @"SELECT * FROM `pedidos` WHERE DATE(`creado`) = ?");
        assert_eq!(
            statement.params,
            vec![FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())]
        );
    }

    #[tokio::test]
    async fn test_get_normalizes_rows() {
        let stored = row([
            ("id", FieldValue::Integer(1)),
            (
                "creado",
                FieldValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
            ),
        ]);
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Postgres).with_rows(vec![stored]));
        let rows = gw.get_by_key("usuarios", "id", "1", None).await.unwrap();
        assert_eq!(rows[0]["creado"], FieldValue::String("2024-01-15".into()));
    }

    #[tokio::test]
    async fn test_list_limits() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Postgres));
        gw.list("usuarios", None, None).await.unwrap();
        gw.list("usuarios", None, Some(0)).await.unwrap();
        gw.list("usuarios", Some("  "), Some(25)).await.unwrap();

        let limits: Vec<FieldValue> = backend
            .statements()
            .into_iter()
            .map(|s| s.params[0].clone())
            .collect();
        assert_eq!(
            limits,
            vec![
                FieldValue::Integer(1000),
                FieldValue::Integer(1000),
                FieldValue::Integer(25)
            ]
        );
        assert!(backend.last_statement().sql.contains(r#""public"."usuarios""#));
    }

    #[tokio::test]
    async fn test_validation_fails_before_io() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Mssql));
        let cases = [
            gw.list("  ", None, None).await.err(),
            gw.get_by_key("usuarios", "", "1", None).await.err(),
            gw.get_by_key("usuarios", "id", " ", None).await.err(),
            gw.delete("usuarios", "id", "", None).await.err(),
        ];
        for err in cases {
            assert_eq!(err.map(|e| e.severity()), Some(Severity::BadInput));
        }
        let err = gw
            .create("usuarios", RowPayload::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(_)));
        let err = gw
            .create("usuarios", usuario(), None, Some(" , "))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidArgument(_)));

        assert!(backend.statements().is_empty());
        assert!(backend.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_carries_context() {
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Postgres).failing_with("connection reset"));
        let err = gw.list("usuarios", Some("ventas"), None).await.unwrap_err();
        assert!(matches!(err, GatewayError::StoreExecution { .. }));
        let message = err.to_string();
        assert!(message.contains("ventas.usuarios"), "{message}");
        assert!(message.contains("connection reset"), "{message}");
    }

    #[tokio::test]
    async fn test_operation_times_out() {
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Mssql).with_delay(Duration::from_millis(200)));
        let gw = gw.with_timeout(Duration::from_millis(10));
        let err = gw.list("usuarios", None, None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout { .. }));
        assert_eq!(err.severity(), Severity::Internal);
    }

    #[tokio::test]
    async fn test_verify_password_outcomes() {
        let hash = hashing::hash("s3cret", hashing::MIN_COST).unwrap();
        let stored = vec![row([("contrasena", FieldValue::String(hash))])];
        let (gw, backend) = gateway(
            RecordingBackend::new(Dialect::Postgres)
                .with_column("email", "character varying")
                .with_rows(stored),
        );

        let check = gw
            .verify_password("usuarios", "email", "a@b.com", "contrasena", "s3cret", None)
            .await
            .unwrap();
        assert_eq!(check, CredentialCheck::Valid);

        let check = gw
            .verify_password("usuarios", "email", "a@b.com", "contrasena", "wrong", None)
            .await
            .unwrap();
        assert_eq!(check, CredentialCheck::Invalid);

        let statement = backend.last_statement();
        insta::assert_snapshot!(statement.sql, @r#"SELECT "contrasena" FROM "public"."usuarios" WHERE "email" = $1 LIMIT 1"#);

        let (gw, _) = gateway(RecordingBackend::new(Dialect::Postgres));
        let check = gw
            .verify_password("usuarios", "email", "nadie@b.com", "contrasena", "s3cret", None)
            .await
            .unwrap();
        assert_eq!(check, CredentialCheck::NotFound);
    }

    #[tokio::test]
    async fn test_null_stored_hash_counts_as_not_found() {
        let stored = vec![row([("contrasena", FieldValue::Null)])];
        let (gw, _) = gateway(RecordingBackend::new(Dialect::Mssql).with_rows(stored));
        let check = gw
            .verify_password("usuarios", "email", "a@b.com", "contrasena", "s3cret", None)
            .await
            .unwrap();
        assert_eq!(check, CredentialCheck::NotFound);
    }

    #[tokio::test]
    async fn test_key_filter_uses_equality_for_plain_columns() {
        let (gw, backend) = gateway(RecordingBackend::new(Dialect::Mssql));
        let table = gw.table("usuarios", None).unwrap();
        let filter = gw.key_filter(&table, "email", "a@b.com").await;
        assert_eq!(filter.comparison, Comparison::Equals);
        assert_eq!(backend.lookups(), vec!["email".to_string()]);
    }
}
