//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod code;
mod pipeline;
mod report;
mod run;

pub use code::CodeCommands;
pub use pipeline::PipelineCommands;
pub use report::ReportCommands;
pub use run::RunCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Reference code management
    Codes {
        #[command(subcommand)]
        command: CodeCommands,
    },
    /// Pipeline catalog management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Run tracking and inspection
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Dashboard reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Codes { command } => code::handle_code_command(command, config).await,
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Report { command } => report::handle_report_command(command, config).await,
    }
}

/// Format a timestamp the way every listing shows it
pub(crate) fn format_ts(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Colorize an active flag for display
pub(crate) fn active_marker(is_active: bool) -> ColoredString {
    if is_active {
        "active".green()
    } else {
        "inactive".dimmed()
    }
}
