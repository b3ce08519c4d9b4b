//! Configuration module
//!
//! Handles CLI configuration: server URL and the run environment.

use ledger_client::LedgerClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the ledger server
    pub server_url: String,
    /// Environment code used by `run start`
    pub environment: String,
}

impl Config {
    /// Build a client bound to this configuration
    pub fn client(&self) -> LedgerClient {
        LedgerClient::new(&self.server_url, &self.environment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_uses_configured_environment() {
        let config = Config {
            server_url: "http://ledger:8080/".to_string(),
            environment: "prod".to_string(),
        };

        let client = config.client();
        assert_eq!(client.base_url(), "http://ledger:8080");
        assert_eq!(client.environment(), "prod");
    }
}
