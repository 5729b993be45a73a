use std::time::Duration;

use thiserror::Error;

use crate::dialect::Dialect;

/// SQLSTATE raised by PostgreSQL for `insufficient_privilege`.
const PG_INSUFFICIENT_PRIVILEGE: &str = "42501";

/// MySQL error numbers for access-denied conditions on databases, tables,
/// columns, privileges and routines.
const MYSQL_ACCESS_DENIED: &[u16] = &[1044, 1142, 1143, 1227, 1370];

/// SQL Server error numbers for permission failures on objects, columns,
/// databases and server principals.
const MSSQL_ACCESS_DENIED: &[u32] = &[229, 230, 262, 297, 300, 916];

/// Driver-level failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("MSSQL error: {0}")]
    Mssql(#[from] tiberius::error::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] bb8::RunError<tiberius::error::Error>),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl StoreError {
    /// True when the store refused the statement for authorization reasons.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db)) => {
                if let Some(mysql) = db.try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>() {
                    return MYSQL_ACCESS_DENIED.contains(&mysql.number());
                }
                db.code().as_deref() == Some(PG_INSUFFICIENT_PRIVILEGE)
            }
            StoreError::Mssql(err) | StoreError::Pool(bb8::RunError::User(err)) => {
                matches!(err, tiberius::error::Error::Server(token) if MSSQL_ACCESS_DENIED.contains(&token.code()))
            }
            _ => false,
        }
    }
}

/// The four externally observable severities, independent of transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    BadInput,
    Forbidden,
    NotFound,
    Internal,
}

impl Severity {
    /// Process exit code used by the command line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            Severity::Internal => 1,
            Severity::BadInput => 2,
            Severity::Forbidden => 3,
            Severity::NotFound => 4,
        }
    }
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Permission denied during {operation} on '{context}': {source}")]
    PermissionDenied {
        operation: &'static str,
        context: String,
        source: StoreError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{dialect} error during {operation} on '{context}': {source}")]
    StoreExecution {
        dialect: Dialect,
        operation: &'static str,
        context: String,
        source: StoreError,
    },

    #[error("Provider '{provider}' has no registered backend. Options: {}", .valid.join(", "))]
    UnsupportedProvider {
        provider: String,
        valid: Vec<&'static str>,
    },

    #[error("{operation} on '{context}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        context: String,
        after: Duration,
    },

    #[error("Hashing error: {0}")]
    Hash(String),
}

impl GatewayError {
    /// Wrap a driver failure with the table context it happened in.
    pub fn from_store(
        dialect: Dialect,
        operation: &'static str,
        context: String,
        source: StoreError,
    ) -> Self {
        if source.is_permission_denied() {
            GatewayError::PermissionDenied {
                operation,
                context,
                source,
            }
        } else {
            GatewayError::StoreExecution {
                dialect,
                operation,
                context,
                source,
            }
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        GatewayError::InvalidArgument(message.into())
    }

    pub fn severity(&self) -> Severity {
        match self {
            GatewayError::InvalidArgument(_) | GatewayError::UnsupportedProvider { .. } => {
                Severity::BadInput
            }
            GatewayError::PermissionDenied { .. } => Severity::Forbidden,
            GatewayError::NotFound(_) => Severity::NotFound,
            GatewayError::StoreExecution { .. }
            | GatewayError::Timeout { .. }
            | GatewayError::Hash(_) => Severity::Internal,
        }
    }
}
