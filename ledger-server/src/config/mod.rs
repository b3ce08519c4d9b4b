//! Server configuration
//!
//! Defines all configurable parameters for the server: which environment it
//! serves, where it listens, connection pool sizing, and where database
//! credentials come from.

pub mod credentials;

use std::path::PathBuf;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use credentials::{CredentialProvider, DatabaseUrlProvider, EnvVarProvider, SecretFileProvider};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Environment name used to key credential lookup (e.g. "dev", "prod")
    pub environment: String,

    /// Address the HTTP listener binds to
    pub bind_addr: String,

    /// Maximum pooled database connections
    pub max_connections: u32,

    /// How long a request waits for a pooled connection
    pub acquire_timeout: Duration,

    /// Directory holding `pipeline-db-config-{env}.json` secret files
    pub secrets_dir: Option<PathBuf>,

    /// Explicit connection URL, overrides every other credential source
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: "dev".to_string(),
            bind_addr: "0.0.0.0:8080".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            secrets_dir: None,
            database_url: None,
        }
    }
}

impl ServerConfig {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - LEDGER_ENVIRONMENT (default: dev)
    /// - LEDGER_BIND_ADDR (default: 0.0.0.0:8080)
    /// - LEDGER_DB_MAX_CONNECTIONS (default: 10)
    /// - LEDGER_DB_ACQUIRE_TIMEOUT_SECS (default: 5)
    /// - LEDGER_SECRETS_DIR
    /// - DATABASE_URL
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = lookup("LEDGER_ENVIRONMENT")
            .map(|env| env.trim().to_lowercase())
            .unwrap_or(defaults.environment);

        if environment.is_empty() {
            anyhow::bail!("LEDGER_ENVIRONMENT must not be blank");
        }

        let bind_addr = lookup("LEDGER_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let max_connections = match lookup("LEDGER_DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().map_err(|e| {
                anyhow::anyhow!("Invalid LEDGER_DB_MAX_CONNECTIONS '{}': {}", raw, e)
            })?,
            None => defaults.max_connections,
        };

        if max_connections == 0 {
            anyhow::bail!("LEDGER_DB_MAX_CONNECTIONS must be at least 1");
        }

        let acquire_timeout = match lookup("LEDGER_DB_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                anyhow::anyhow!("Invalid LEDGER_DB_ACQUIRE_TIMEOUT_SECS '{}': {}", raw, e)
            })?,
            None => defaults.acquire_timeout,
        };

        Ok(Self {
            environment,
            bind_addr,
            max_connections,
            acquire_timeout,
            secrets_dir: lookup("LEDGER_SECRETS_DIR").map(PathBuf::from),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
        })
    }

    /// Picks the credential source for this configuration
    ///
    /// Precedence: `DATABASE_URL`, then the secret file directory, then
    /// discrete `DB_*` environment variables.
    pub fn credential_provider(&self) -> Box<dyn CredentialProvider> {
        if let Some(url) = &self.database_url {
            Box::new(DatabaseUrlProvider::new(url.clone()))
        } else if let Some(dir) = &self.secrets_dir {
            Box::new(SecretFileProvider::new(dir.clone()))
        } else {
            Box::new(EnvVarProvider::from_process_env())
        }
    }

    /// Resolves connection options for the configured environment
    pub fn resolve_connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        let provider = self.credential_provider();

        tracing::info!("Using {} credential source", provider.name());

        provider.resolve(&self.environment)
    }
}
