use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::Backend;
use crate::dialect::Dialect;
use crate::error::StoreError;
use crate::schema::TableRef;
use crate::sql::Statement;
use crate::value::RowPayload;

/// In-memory backend with a scripted catalog and canned results.
/// Every statement it receives is recorded for inspection.
pub struct RecordingBackend {
    dialect: Dialect,
    catalog: HashMap<String, String>,
    catalog_fails: bool,
    rows: Vec<RowPayload>,
    affected: u64,
    fail_with: Option<String>,
    delay: Option<Duration>,
    statements: Mutex<Vec<Statement>>,
    lookups: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn new(dialect: Dialect) -> Self {
        RecordingBackend {
            dialect,
            catalog: HashMap::new(),
            catalog_fails: false,
            rows: Vec::new(),
            affected: 1,
            fail_with: None,
            delay: None,
            statements: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_column(mut self, column: &str, catalog_type: &str) -> Self {
        self.catalog
            .insert(column.to_string(), catalog_type.to_string());
        self
    }

    pub fn with_rows(mut self, rows: Vec<RowPayload>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_affected(mut self, affected: u64) -> Self {
        self.affected = affected;
        self
    }

    pub fn failing_catalog(mut self) -> Self {
        self.catalog_fails = true;
        self
    }

    /// Make every fetch/execute fail with a connection error.
    pub fn failing_with(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    pub fn last_statement(&self) -> Statement {
        self.statements()
            .pop()
            .expect("no statement was issued")
    }

    /// Columns looked up in the catalog, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    async fn record(&self, statement: &Statement) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.statements.lock().unwrap().push(statement.clone());
        match &self.fail_with {
            Some(message) => Err(StoreError::Connection(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn lookup_column_type(
        &self,
        _table: &TableRef,
        column: &str,
    ) -> Result<Option<String>, StoreError> {
        self.lookups.lock().unwrap().push(column.to_string());
        if self.catalog_fails {
            return Err(StoreError::Connection("catalog unreachable".to_string()));
        }
        Ok(self.catalog.get(column).cloned())
    }

    async fn fetch(&self, statement: &Statement) -> Result<Vec<RowPayload>, StoreError> {
        self.record(statement).await?;
        Ok(self.rows.clone())
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        self.record(statement).await?;
        Ok(self.affected)
    }
}

/// Build a row from `(column, value)` pairs.
pub fn row<const N: usize>(cells: [(&str, crate::value::FieldValue); N]) -> RowPayload {
    cells
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect()
}
