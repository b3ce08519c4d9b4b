//! Ledger CLI
//!
//! Command-line interface for the pipeline run ledger: reference codes,
//! the pipeline catalog, run tracking and reports.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(about = "Pipeline Run Ledger CLI", long_about = None)]
struct Cli {
    /// Ledger server URL
    #[arg(
        long,
        env = "LEDGER_SERVER_URL",
        default_value = "http://localhost:8080"
    )]
    server_url: String,

    /// Environment runs are started in
    #[arg(long, env = "LEDGER_ENVIRONMENT", default_value = "dev")]
    environment: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        server_url: cli.server_url,
        environment: cli.environment,
    };

    handle_command(cli.command, &config).await
}
