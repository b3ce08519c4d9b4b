//! Run command handlers
//!
//! Starts, completes and annotates runs the same way pipeline jobs do, and
//! inspects the ledger.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::*;
use ledger_client::LedgerClient;
use ledger_core::domain::run::{PipelineRun, PipelineRunDetail, RunOutcome, RunStatus};
use ledger_core::dto::run::RunFilter;

use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::PipelineRef;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Start a run of the active pipeline with this tag
    Start { tag: String },
    /// Complete a run
    Complete {
        id: i64,
        /// success or failure
        #[arg(short, long)]
        outcome: RunOutcome,
        /// Free text, typically a failure reason
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Append a detail to a run
    Detail {
        id: i64,
        /// PIPELINE_RUN_DETAIL_TYPE code
        #[arg(short = 't', long = "type")]
        detail_type: String,
        data: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a run with its latest details
    Show { id: i64 },
    /// List runs, newest first
    List {
        /// Pipeline id or tag
        #[arg(short, long)]
        pipeline: Option<String>,
        /// Environment code
        #[arg(short, long)]
        environment: Option<String>,
        /// RUNNING, COMPLETED or FAILED
        #[arg(short, long)]
        status: Option<RunStatus>,
        /// RFC 3339 timestamp
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// RFC 3339 timestamp
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        #[arg(short, long, default_value = "50")]
        limit: i64,
    },
    /// List every detail recorded for a run
    Details {
        id: i64,
        /// Only the newest detail per type
        #[arg(long)]
        latest: bool,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        RunCommands::Start { tag } => {
            let run_id = client.start_run(&tag).await?;
            println!(
                "{}",
                format!("✓ Run {} started in {}", run_id, client.environment())
                    .green()
                    .bold()
            );
            println!("{}", run_id);
            Ok(())
        }
        RunCommands::Complete {
            id,
            outcome,
            description,
        } => {
            client
                .complete_run(id, outcome, description.as_deref())
                .await?;
            println!(
                "{}",
                format!("✓ Run {} completed ({})", id, outcome).green().bold()
            );
            Ok(())
        }
        RunCommands::Detail {
            id,
            detail_type,
            data,
            description,
        } => {
            let detail_id = client
                .add_run_detail(id, &detail_type, &data, description.as_deref())
                .await?;
            println!(
                "{}",
                format!("✓ Detail {} added to run {}", detail_id, id)
                    .green()
                    .bold()
            );
            Ok(())
        }
        RunCommands::Show { id } => show_run(&client, id).await,
        RunCommands::List {
            pipeline,
            environment,
            status,
            since,
            until,
            limit,
        } => {
            let pipeline_id = match pipeline {
                Some(p) => Some(resolve_pipeline_id(&client, &PipelineRef::parse(&p)).await?),
                None => None,
            };
            let filter = RunFilter {
                pipeline_id,
                environment,
                status,
                started_after: since,
                started_before: until,
                limit: Some(limit),
            };
            list_runs(&client, &filter).await
        }
        RunCommands::Details { id, latest } => {
            let details = client.list_run_details(id, latest).await?;
            if details.is_empty() {
                println!("{}", format!("No details for run {}.", id).yellow());
            }
            for detail in &details {
                print_run_detail(detail);
            }
            Ok(())
        }
    }
}

async fn show_run(client: &LedgerClient, id: i64) -> Result<()> {
    let run = client.get_run(id).await?;
    let details = client.list_run_details(id, true).await?;

    println!("{}", "Run Details:".bold());
    println!("  ID:          {}", run.pipeline_run_id.to_string().cyan());
    println!(
        "  Pipeline:    {} ({})",
        run.pipeline_name.bold(),
        run.pipeline_id
    );
    println!("  Environment: {}", run.env_code);
    println!("  Status:      {}", colorize_status(run.status));
    println!("  Started:     {}", super::format_ts(&run.start_dt));
    if let Some(end) = &run.end_dt {
        println!("  Ended:       {}", super::format_ts(end));
    }
    if let Some(duration) = run.duration() {
        println!("  Duration:    {}s", duration.num_seconds());
    }
    if let Some(desc) = &run.description {
        println!("  Description: {}", desc);
    }

    if !details.is_empty() {
        println!("\n{}", "Latest details:".bold());
        for detail in &details {
            print_run_detail(detail);
        }
    }

    Ok(())
}

async fn list_runs(client: &LedgerClient, filter: &RunFilter) -> Result<()> {
    let runs = client.list_runs(filter).await?;

    if runs.is_empty() {
        println!("{}", "No runs found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} run(s):", runs.len()).bold());
    println!();
    for run in &runs {
        print_run_summary(run);
    }

    Ok(())
}

fn print_run_summary(run: &PipelineRun) {
    println!(
        "  {} Run {} {} [{}] {}",
        "▸".cyan(),
        run.pipeline_run_id.to_string().dimmed(),
        run.pipeline_name.bold(),
        run.env_code,
        colorize_status(run.status)
    );
    let ended = run
        .end_dt
        .as_ref()
        .map(super::format_ts)
        .unwrap_or_else(|| "-".to_string());
    println!(
        "    {} → {}",
        super::format_ts(&run.start_dt).dimmed(),
        ended.dimmed()
    );
}

fn print_run_detail(detail: &PipelineRunDetail) {
    let data = match detail.data_json() {
        Some(json) if json.is_object() || json.is_array() => {
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| detail.detail_data.clone())
        }
        _ => detail.detail_data.clone(),
    };

    println!(
        "  {} {} {} {}",
        super::format_ts(&detail.created_at).dimmed(),
        detail.detail_type.cyan(),
        data,
        detail
            .detail_desc
            .as_ref()
            .map(|d| format!("({})", d))
            .unwrap_or_default()
            .dimmed()
    );
}

/// Colorize run status for display
fn colorize_status(status: RunStatus) -> ColoredString {
    let label = status.as_code();
    match status {
        RunStatus::Running => label.cyan(),
        RunStatus::Completed => label.green(),
        RunStatus::Failed => label.red(),
    }
}
