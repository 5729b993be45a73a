//! Dialect-aware statement assembly.
//!
//! Only identifiers are spliced into the SQL text; every value travels as a
//! positional parameter. `NULL` is the one exception: it is written as the
//! keyword so that no driver-typed null reaches a column of another type.

use crate::dialect::Dialect;
use crate::schema::TableRef;
use crate::value::{FieldValue, RowPayload};

/// Row limit applied to `list` when the caller supplies none.
pub const DEFAULT_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `column = value`
    Equals,
    /// The column is truncated to its date before comparing.
    SameDate,
}

/// A `WHERE <column> = <value>` predicate with an already-coerced value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFilter {
    pub column: String,
    pub comparison: Comparison,
    pub value: FieldValue,
}

impl KeyFilter {
    pub fn new(column: &str, comparison: Comparison, value: FieldValue) -> Self {
        KeyFilter {
            column: column.to_string(),
            comparison,
            value,
        }
    }

    pub fn equals(column: &str, value: FieldValue) -> Self {
        KeyFilter::new(column, Comparison::Equals, value)
    }
}

/// SQL text plus the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<FieldValue>,
}

struct Params {
    dialect: Dialect,
    values: Vec<FieldValue>,
}

impl Params {
    fn new(dialect: Dialect) -> Self {
        Params {
            dialect,
            values: Vec::new(),
        }
    }

    /// Register a value and return the text that stands for it.
    fn push(&mut self, value: FieldValue) -> String {
        if value.is_null() {
            return "NULL".to_string();
        }
        self.values.push(value);
        self.dialect.placeholder(self.values.len())
    }

    fn finish(self, sql: String) -> Statement {
        Statement {
            sql,
            params: self.values,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder {
    dialect: Dialect,
}

impl SqlBuilder {
    pub fn new(dialect: Dialect) -> Self {
        SqlBuilder { dialect }
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    fn predicate(&self, filter: &KeyFilter, params: &mut Params) -> String {
        let column = self.quote(&filter.column);
        let lhs = match filter.comparison {
            Comparison::Equals => column,
            Comparison::SameDate => self.dialect.date_cast(&column),
        };
        format!("{lhs} = {}", params.push(filter.value.clone()))
    }

    /// `SELECT *` limited to `limit` rows.
    pub fn list(&self, table: &TableRef, limit: u64) -> Statement {
        let mut params = Params::new(self.dialect);
        let qualified = table.qualified(self.dialect);
        let limit = FieldValue::Integer(i64::try_from(limit).unwrap_or(i64::MAX));
        let sql = match self.dialect {
            Dialect::Mssql => {
                let top = params.push(limit);
                format!("SELECT TOP ({top}) * FROM {qualified}")
            }
            Dialect::Postgres | Dialect::Mysql => {
                let lim = params.push(limit);
                format!("SELECT * FROM {qualified} LIMIT {lim}")
            }
        };
        params.finish(sql)
    }

    pub fn select_where(&self, table: &TableRef, filter: &KeyFilter) -> Statement {
        let mut params = Params::new(self.dialect);
        let predicate = self.predicate(filter, &mut params);
        let sql = format!(
            "SELECT * FROM {} WHERE {predicate}",
            table.qualified(self.dialect)
        );
        params.finish(sql)
    }

    /// Single column of the first matching row (credential lookup).
    pub fn select_single_column(
        &self,
        table: &TableRef,
        column: &str,
        filter: &KeyFilter,
    ) -> Statement {
        let mut params = Params::new(self.dialect);
        let predicate = self.predicate(filter, &mut params);
        let column = self.quote(column);
        let qualified = table.qualified(self.dialect);
        let sql = match self.dialect {
            Dialect::Mssql => {
                format!("SELECT TOP (1) {column} FROM {qualified} WHERE {predicate}")
            }
            Dialect::Postgres | Dialect::Mysql => {
                format!("SELECT {column} FROM {qualified} WHERE {predicate} LIMIT 1")
            }
        };
        params.finish(sql)
    }

    /// Columns in payload order.
    pub fn insert(&self, table: &TableRef, payload: &RowPayload) -> Statement {
        let mut params = Params::new(self.dialect);
        let mut columns = Vec::with_capacity(payload.len());
        let mut values = Vec::with_capacity(payload.len());
        for (column, value) in payload {
            columns.push(self.quote(column));
            values.push(params.push(value.clone()));
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.qualified(self.dialect),
            columns.join(", "),
            values.join(", ")
        );
        params.finish(sql)
    }

    pub fn update(&self, table: &TableRef, payload: &RowPayload, filter: &KeyFilter) -> Statement {
        let mut params = Params::new(self.dialect);
        let assignments: Vec<String> = payload
            .iter()
            .map(|(column, value)| format!("{} = {}", self.quote(column), params.push(value.clone())))
            .collect();
        let predicate = self.predicate(filter, &mut params);
        let sql = format!(
            "UPDATE {} SET {} WHERE {predicate}",
            table.qualified(self.dialect),
            assignments.join(", ")
        );
        params.finish(sql)
    }

    pub fn delete(&self, table: &TableRef, filter: &KeyFilter) -> Statement {
        let mut params = Params::new(self.dialect);
        let predicate = self.predicate(filter, &mut params);
        let sql = format!(
            "DELETE FROM {} WHERE {predicate}",
            table.qualified(self.dialect)
        );
        params.finish(sql)
    }
}
