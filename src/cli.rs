use clap::{Args, Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::{json, Value};

use crate::config::Settings;
use crate::error::{GatewayError, Severity};
use crate::gateway::{CredentialCheck, Gateway};
use crate::value::{FieldValue, RowPayload};

/// Generic CRUD over any table in SQL Server, PostgreSQL or MySQL/MariaDB.
#[derive(Parser, Debug)]
#[command(name = "tablegate", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct TableArgs {
    /// Table name
    pub table: String,

    /// Schema (defaults to dbo / public / the current database)
    #[arg(long)]
    pub schema: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct KeyArgs {
    /// Column identifying the row
    pub key_column: String,

    /// Value to match, coerced to the column's declared type
    pub key_value: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List rows
    List {
        #[command(flatten)]
        target: TableArgs,

        /// Maximum number of rows (default 1000)
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,
    },
    /// Fetch rows by key
    Get {
        #[command(flatten)]
        target: TableArgs,
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Insert a row from a JSON object
    Create {
        #[command(flatten)]
        target: TableArgs,

        /// JSON object with the column values
        #[arg(long)]
        data: String,

        /// Comma-separated fields to store as bcrypt hashes
        #[arg(long)]
        encrypt: Option<String>,
    },
    /// Update rows matching a key
    Update {
        #[command(flatten)]
        target: TableArgs,
        #[command(flatten)]
        key: KeyArgs,

        /// JSON object with the column values
        #[arg(long)]
        data: String,

        /// Comma-separated fields to store as bcrypt hashes
        #[arg(long)]
        encrypt: Option<String>,
    },
    /// Delete rows matching a key
    Delete {
        #[command(flatten)]
        target: TableArgs,
        #[command(flatten)]
        key: KeyArgs,
    },
    /// Check a password against the stored hash
    VerifyPassword {
        #[command(flatten)]
        target: TableArgs,

        /// Column holding the user identifier
        #[arg(long)]
        user_column: String,

        /// Column holding the password hash
        #[arg(long)]
        password_column: String,

        /// User identifier to look up
        #[arg(long)]
        user: String,

        /// Plaintext password
        #[arg(long, env = "TABLEGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

/// What the binary prints, and the exit code that goes with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub body: Value,
    pub exit_code: u8,
}

impl Response {
    fn ok(body: Value) -> Self {
        Response { body, exit_code: 0 }
    }
}

/// Parse `--data` into a payload, keeping the object's key order.
pub fn parse_payload(raw: &str) -> Result<RowPayload, GatewayError> {
    let object: IndexMap<String, Value> = serde_json::from_str(raw)
        .map_err(|e| GatewayError::invalid(format!("--data must be a JSON object: {e}")))?;
    Ok(object
        .into_iter()
        .map(|(k, v)| (k, FieldValue::from(v)))
        .collect())
}

fn schema_label(gateway: &Gateway, target: &TableArgs) -> Result<Value, GatewayError> {
    let table = gateway.table(&target.table, target.schema.as_deref())?;
    Ok(table.schema.map(Value::String).unwrap_or(Value::Null))
}

/// Run one command against the gateway.
///
/// Zero rows from `get`, and zero affected rows from `update`/`delete`,
/// become `NotFound` here; `list` answers an empty table with "no content".
pub async fn dispatch(command: &Command, gateway: &Gateway) -> Result<Response, GatewayError> {
    match command {
        Command::List { target, limit } => {
            let rows = gateway
                .list(&target.table, target.schema.as_deref(), *limit)
                .await?;
            let schema = schema_label(gateway, target)?;
            if rows.is_empty() {
                return Ok(Response::ok(json!({
                    "status": "no content",
                    "table": target.table,
                    "schema": schema,
                })));
            }
            Ok(Response::ok(json!({
                "table": target.table,
                "schema": schema,
                "limit": limit,
                "total": rows.len(),
                "rows": rows,
            })))
        }
        Command::Get { target, key } => {
            let rows = gateway
                .get_by_key(
                    &target.table,
                    &key.key_column,
                    &key.key_value,
                    target.schema.as_deref(),
                )
                .await?;
            if rows.is_empty() {
                return Err(GatewayError::NotFound(format!(
                    "no row in '{}' where {} = {}",
                    target.table, key.key_column, key.key_value
                )));
            }
            Ok(Response::ok(json!({
                "table": target.table,
                "schema": schema_label(gateway, target)?,
                "filter": { "column": key.key_column, "value": key.key_value },
                "total": rows.len(),
                "rows": rows,
            })))
        }
        Command::Create {
            target,
            data,
            encrypt,
        } => {
            let payload = parse_payload(data)?;
            let created = gateway
                .create(
                    &target.table,
                    payload,
                    target.schema.as_deref(),
                    encrypt.as_deref(),
                )
                .await?;
            Ok(Response::ok(json!({ "table": target.table, "created": created })))
        }
        Command::Update {
            target,
            key,
            data,
            encrypt,
        } => {
            let payload = parse_payload(data)?;
            let affected = gateway
                .update(
                    &target.table,
                    &key.key_column,
                    &key.key_value,
                    payload,
                    target.schema.as_deref(),
                    encrypt.as_deref(),
                )
                .await?;
            affected_or_not_found(target, key, affected)
        }
        Command::Delete { target, key } => {
            let affected = gateway
                .delete(
                    &target.table,
                    &key.key_column,
                    &key.key_value,
                    target.schema.as_deref(),
                )
                .await?;
            affected_or_not_found(target, key, affected)
        }
        Command::VerifyPassword {
            target,
            user_column,
            password_column,
            user,
            password,
        } => {
            let check = gateway
                .verify_password(
                    &target.table,
                    user_column,
                    user,
                    password_column,
                    password,
                    target.schema.as_deref(),
                )
                .await?;
            let exit_code = match check {
                CredentialCheck::Valid => 0,
                CredentialCheck::Invalid => Severity::Forbidden.exit_code(),
                CredentialCheck::NotFound => Severity::NotFound.exit_code(),
            };
            Ok(Response {
                body: json!({ "result": check.as_str() }),
                exit_code,
            })
        }
    }
}

fn affected_or_not_found(
    target: &TableArgs,
    key: &KeyArgs,
    affected: u64,
) -> Result<Response, GatewayError> {
    if affected == 0 {
        return Err(GatewayError::NotFound(format!(
            "no row in '{}' where {} = {}",
            target.table, key.key_column, key.key_value
        )));
    }
    Ok(Response::ok(json!({ "table": target.table, "affected": affected })))
}
