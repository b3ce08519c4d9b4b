//! Ledger HTTP Client
//!
//! Type-safe HTTP client for the ledger server, used by pipeline jobs to
//! record their runs and by the CLI for administration and reports.
//!
//! A client is bound to one environment at construction; `start_run` records
//! every run in that environment.
//!
//! # Example
//!
//! ```no_run
//! use ledger_client::LedgerClient;
//! use ledger_core::domain::run::RunOutcome;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ledger = LedgerClient::new("http://localhost:8080", "prod");
//!
//!     let run_id = ledger.start_run("orders_v1").await?;
//!     ledger
//!         .add_run_detail(run_id, "TOTAL_PROCESSED_COUNT", "1200", None)
//!         .await?;
//!     ledger.complete_run(run_id, RunOutcome::Success, None).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod tracker;

mod codes;
mod pipelines;
mod reports;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use tracker::{RunLedger, TrackError, track_run};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the ledger server API
///
/// Endpoints are grouped by concern:
/// - Run ledger (start, complete, details, run reads)
/// - Reference codes and code types
/// - Pipeline catalog (pipelines, environments, details)
/// - Reports
#[derive(Debug, Clone)]
pub struct LedgerClient {
    /// Base URL of the server (e.g., "http://localhost:8080")
    base_url: String,
    /// Environment code every started run is recorded in
    environment: String,
    /// HTTP client instance
    client: Client,
}

impl LedgerClient {
    /// Create a new ledger client
    ///
    /// # Example
    /// ```
    /// use ledger_client::LedgerClient;
    ///
    /// let client = LedgerClient::new("http://localhost:8080", "dev");
    /// assert_eq!(client.environment(), "dev");
    /// ```
    pub fn new(base_url: impl Into<String>, environment: impl Into<String>) -> Self {
        Self::with_client(base_url, environment, Client::new())
    }

    /// Create a new ledger client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        environment: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            environment: environment.into().trim().to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the environment runs are recorded in
    pub fn environment(&self) -> &str {
        &self.environment
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = LedgerClient::new("http://localhost:8080", "dev");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.environment(), "dev");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = LedgerClient::new("http://localhost:8080/", "dev");
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/runs/start"), "http://localhost:8080/runs/start");
    }

    #[test]
    fn test_client_with_custom_client() {
        let http_client = Client::new();
        let client = LedgerClient::with_client("http://localhost:8080", " prod ", http_client);
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.environment(), "prod");
    }
}
