use std::time::Duration;

use clap::Args;

use crate::backend;
use crate::dialect::Dialect;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::hashing;

/// Connection and runtime settings, read from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Database provider (sqlserver, sqlserverexpress, localdb, mssql, postgres, postgresql, mysql, mariadb)
    #[arg(long, env = "DB_PROVIDER", default_value = "sqlserver", global = true)]
    pub provider: String,

    /// Connection string; defaults to the DB_<PROVIDER> variable (e.g. DB_POSTGRES)
    #[arg(long, env = "DB_CONNECTION", hide_env_values = true, global = true)]
    pub connection: Option<String>,

    /// Per-operation timeout in seconds
    #[arg(long, env = "DB_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// bcrypt cost factor for encrypted fields
    #[arg(
        long,
        env = "HASH_COST",
        default_value_t = hashing::DEFAULT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31),
        global = true
    )]
    pub hash_cost: u32,
}

impl Settings {
    /// Name of the provider-specific connection variable, e.g. `DB_MARIADB`.
    pub fn provider_variable(&self) -> String {
        format!("DB_{}", self.provider.trim().to_uppercase())
    }

    /// Explicit connection string, else the provider-specific variable.
    pub fn connection_string(&self) -> Result<String, GatewayError> {
        let variable = self.provider_variable();
        self.connection
            .clone()
            .or_else(|| std::env::var(&variable).ok())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::invalid(format!(
                    "no connection string: pass --connection or set DB_CONNECTION or {variable}"
                ))
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the provider and wire a gateway. The pool is opened on first use.
    pub fn gateway(&self) -> Result<Gateway, GatewayError> {
        // An unknown provider is reported before a missing connection string.
        Dialect::from_provider(&self.provider)?;
        let backend = backend::select_backend(&self.provider, self.connection_string()?)?;
        Ok(Gateway::new(backend)
            .with_timeout(self.timeout())
            .with_hash_cost(self.hash_cost))
    }
}
