//! Report command handlers

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::config::Config;

#[derive(Args, Clone, Copy)]
pub struct WindowArgs {
    /// Look-back window in days
    #[arg(short, long, default_value = "30")]
    days: i32,
}

/// Report subcommands
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Headline numbers
    Overview(WindowArgs),
    /// Success rate per pipeline type
    ByType(WindowArgs),
    /// Run counts per environment
    ByEnvironment(WindowArgs),
    /// Run counts per day and status
    Daily(WindowArgs),
    /// Per-pipeline run counts and average duration
    Pipelines(WindowArgs),
}

/// Handle report commands
pub async fn handle_report_command(command: ReportCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        ReportCommands::Overview(WindowArgs { days }) => {
            let overview = client.report_overview(days).await?;
            println!("{}", format!("Overview (last {} days)", days).bold());
            println!("  Active pipelines: {}", overview.active_pipelines.to_string().cyan());
            println!("  Runs today:       {}", overview.runs_today.to_string().cyan());
            println!("  Success rate:     {}", rate(overview.success_rate_pct));
            println!("  Active codes:     {}", overview.active_codes);
        }
        ReportCommands::ByType(WindowArgs { days }) => {
            let rows = client.report_success_by_type(days).await?;
            if rows.is_empty() {
                println!("{}", "No finished runs in window.".yellow());
            }
            for row in rows {
                println!(
                    "  {:<12} {:>6} / {:<6} {}",
                    row.pipeline_type.bold(),
                    row.completed_runs,
                    row.total_runs,
                    rate(row.success_rate_pct)
                );
            }
        }
        ReportCommands::ByEnvironment(WindowArgs { days }) => {
            let rows = client.report_runs_by_environment(days).await?;
            if rows.is_empty() {
                println!("{}", "No runs in window.".yellow());
            }
            for row in rows {
                println!("  {:<8} {}", row.environment.bold(), row.run_count);
            }
        }
        ReportCommands::Daily(WindowArgs { days }) => {
            let rows = client.report_daily_counts(days).await?;
            if rows.is_empty() {
                println!("{}", "No runs in window.".yellow());
            } else {
                println!(
                    "  {:<10} {:>9} {:>7} {:>8} {:>6}",
                    "date", "completed", "failed", "running", "total"
                );
            }
            for row in rows {
                println!(
                    "  {:<10} {:>9} {:>7} {:>8} {:>6}",
                    row.run_date.to_string(),
                    row.completed.to_string().green(),
                    row.failed.to_string().red(),
                    row.running.to_string().cyan(),
                    row.total
                );
            }
        }
        ReportCommands::Pipelines(WindowArgs { days }) => {
            let rows = client.report_pipeline_performance(days).await?;
            if rows.is_empty() {
                println!("{}", "No pipelines found.".yellow());
            }
            for row in rows {
                let avg = row
                    .avg_duration_minutes
                    .map(|m| format!("{:.1} min", m))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "  {} {} ({})",
                    "▸".cyan(),
                    row.pipeline_name.bold(),
                    row.pipeline_type.dimmed()
                );
                println!(
                    "    runs {}  completed {}  failed {}  running {}  avg {}",
                    row.total_runs,
                    row.completed_runs.to_string().green(),
                    row.failed_runs.to_string().red(),
                    row.running_runs.to_string().cyan(),
                    avg
                );
            }
        }
    }

    Ok(())
}

fn rate(pct: f64) -> ColoredString {
    let label = format!("{:.1}%", pct);
    if pct >= 90.0 {
        label.green()
    } else if pct >= 50.0 {
        label.yellow()
    } else {
        label.red()
    }
}
