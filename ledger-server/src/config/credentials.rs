//! Database credential sources
//!
//! Credentials are resolved once at startup, keyed by environment name. The
//! secret document shape (`DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`,
//! `DB_PASSWORD`) is shared by the secret file and environment variable
//! sources so the same secret can be mounted either way.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

/// A source of database connection parameters
pub trait CredentialProvider: Send + Sync {
    /// Short label used in startup logs
    fn name(&self) -> &'static str;

    /// Resolve connection options for `environment`
    fn resolve(&self, environment: &str) -> anyhow::Result<PgConnectOptions>;
}

/// Connection parameters as stored in a secret
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbCredentials {
    #[serde(rename = "DB_HOST")]
    pub host: String,
    #[serde(rename = "DB_PORT", deserialize_with = "port_from_value")]
    pub port: u16,
    #[serde(rename = "DB_NAME")]
    pub database: String,
    #[serde(rename = "DB_USER")]
    pub user: String,
    #[serde(rename = "DB_PASSWORD", default)]
    pub password: String,
}

impl DbCredentials {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.database)
            .username(&self.user)
            .password(&self.password)
    }
}

// Secrets written by hand often quote the port
fn port_from_value<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    match PortValue::deserialize(deserializer)? {
        PortValue::Number(port) => Ok(port),
        PortValue::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Providers
// =============================================================================

/// Uses a full connection URL as-is
#[derive(Debug, Clone)]
pub struct DatabaseUrlProvider {
    url: String,
}

impl DatabaseUrlProvider {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl CredentialProvider for DatabaseUrlProvider {
    fn name(&self) -> &'static str {
        "DATABASE_URL"
    }

    fn resolve(&self, _environment: &str) -> anyhow::Result<PgConnectOptions> {
        PgConnectOptions::from_str(&self.url).context("Invalid DATABASE_URL")
    }
}

/// Reads `pipeline-db-config-{env}.json` from a mounted secrets directory
#[derive(Debug, Clone)]
pub struct SecretFileProvider {
    dir: PathBuf,
}

impl SecretFileProvider {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the secret for `environment`
    pub fn secret_path(&self, environment: &str) -> PathBuf {
        self.dir.join(format!(
            "pipeline-db-config-{}.json",
            environment.trim().to_lowercase()
        ))
    }
}

impl CredentialProvider for SecretFileProvider {
    fn name(&self) -> &'static str {
        "secret file"
    }

    fn resolve(&self, environment: &str) -> anyhow::Result<PgConnectOptions> {
        let path = self.secret_path(environment);

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read secret file: {}", path.display()))?;

        let credentials: DbCredentials = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed secret file: {}", path.display()))?;

        Ok(credentials.connect_options())
    }
}

/// Reads discrete `DB_*` variables, falling back to local defaults
#[derive(Debug, Clone, Default)]
pub struct EnvVarProvider {
    vars: HashMap<String, String>,
}

impl EnvVarProvider {
    const KEYS: [&'static str; 5] = ["DB_HOST", "DB_PORT", "DB_NAME", "DB_USER", "DB_PASSWORD"];

    pub fn new(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn from_process_env() -> Self {
        let mut vars: HashMap<String, String> = Self::KEYS
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();

        if let Ok(user) = std::env::var("USER") {
            vars.entry("DB_USER".to_string()).or_insert(user);
        }

        Self { vars }
    }

    fn get_or(&self, key: &str, default: &str) -> String {
        self.vars
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    pub fn credentials(&self) -> anyhow::Result<DbCredentials> {
        let raw_port = self.get_or("DB_PORT", "5432");
        let port = raw_port
            .trim()
            .parse::<u16>()
            .with_context(|| format!("Invalid DB_PORT '{}'", raw_port))?;

        Ok(DbCredentials {
            host: self.get_or("DB_HOST", "localhost"),
            port,
            database: self.get_or("DB_NAME", "pipeline_management"),
            user: self.get_or("DB_USER", "postgres"),
            password: self.get_or("DB_PASSWORD", ""),
        })
    }
}

impl CredentialProvider for EnvVarProvider {
    fn name(&self) -> &'static str {
        "environment variables"
    }

    fn resolve(&self, _environment: &str) -> anyhow::Result<PgConnectOptions> {
        Ok(self.credentials()?.connect_options())
    }
}
