//! Pipeline command handlers
//!
//! Handles the pipeline catalog: pipelines, their environment bindings and
//! per-environment configuration details.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use ledger_client::LedgerClient;
use ledger_core::domain::pipeline::{Pipeline, PipelineDetail};
use ledger_core::dto::pipeline::{CreatePipeline, CreatePipelineDetail, PipelineSummary};

use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::PipelineRef;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a pipeline
    Create(PipelineArgs),
    /// List all pipelines
    List,
    /// Show a pipeline with its environments and details
    Show {
        /// Pipeline id or tag
        pipeline: String,
    },
    /// Replace a pipeline's attributes
    Update {
        /// Pipeline id or tag
        pipeline: String,
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Delete a pipeline with all its environments, details and runs
    Delete {
        /// Pipeline id or tag
        pipeline: String,
    },
    /// Environment bindings
    Env {
        #[command(subcommand)]
        command: EnvCommands,
    },
    /// Configuration details
    Detail {
        #[command(subcommand)]
        command: DetailCommands,
    },
}

#[derive(Args)]
pub struct PipelineArgs {
    #[arg(short, long)]
    name: String,

    /// PIPELINE_TYPE code
    #[arg(short = 't', long = "type", default_value = "BATCH")]
    pipeline_type: String,

    /// PIPELINE_STATUS code
    #[arg(short, long, default_value = "ACTIVE")]
    status: String,

    #[arg(short, long)]
    description: Option<String>,

    /// Tag jobs use to start runs
    #[arg(long)]
    tag: Option<String>,

    /// Mark the pipeline inactive
    #[arg(long)]
    inactive: bool,
}

impl From<PipelineArgs> for CreatePipeline {
    fn from(args: PipelineArgs) -> Self {
        CreatePipeline {
            pipeline_name: args.name,
            pipeline_type: args.pipeline_type,
            pipeline_status: args.status,
            description: args.description,
            tag: args.tag,
            is_active: !args.inactive,
        }
    }
}

#[derive(Subcommand)]
pub enum EnvCommands {
    /// Bind a pipeline to an environment
    Add {
        pipeline: String,
        /// PIPELINE_ENVIRONMENT code, e.g. DEV
        env_code: String,
    },
    /// List a pipeline's environments
    List { pipeline: String },
    /// Remove an environment binding with its details and runs
    Remove { environment_id: i64 },
}

#[derive(Subcommand)]
pub enum DetailCommands {
    /// Add a configuration detail
    Add {
        pipeline: String,
        #[command(flatten)]
        args: DetailArgs,
    },
    /// List a pipeline's configuration details
    List { pipeline: String },
    /// Replace a configuration detail
    Update {
        detail_id: i64,
        #[command(flatten)]
        args: DetailArgs,
    },
    /// Delete a configuration detail
    Delete { detail_id: i64 },
}

#[derive(Args)]
pub struct DetailArgs {
    #[arg(short, long)]
    environment_id: i64,

    /// PIPELINE_RUN_DETAIL_TYPE code
    #[arg(short = 't', long = "type")]
    detail_type: String,

    #[arg(short, long)]
    description: String,

    #[arg(long)]
    data: Option<String>,
}

impl From<DetailArgs> for CreatePipelineDetail {
    fn from(args: DetailArgs) -> Self {
        CreatePipelineDetail {
            environment_id: args.environment_id,
            detail_type: args.detail_type,
            detail_desc: args.description,
            detail_data: args.data,
        }
    }
}

/// Handle pipeline commands
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        PipelineCommands::Create(args) => {
            let pipeline = client.create_pipeline(args.into()).await?;
            println!("{}", "✓ Pipeline created successfully!".green().bold());
            print_pipeline_details(&pipeline);
            Ok(())
        }
        PipelineCommands::List => list_pipelines(&client).await,
        PipelineCommands::Show { pipeline } => show_pipeline(&client, &pipeline).await,
        PipelineCommands::Update { pipeline, args } => {
            let id = resolve(&client, &pipeline).await?;
            let pipeline = client.update_pipeline(id, args.into()).await?;
            println!("{}", "✓ Pipeline updated successfully!".green().bold());
            print_pipeline_details(&pipeline);
            Ok(())
        }
        PipelineCommands::Delete { pipeline } => {
            let id = resolve(&client, &pipeline).await?;
            client.delete_pipeline(id).await?;
            println!(
                "{}",
                format!("✓ Pipeline {} deleted successfully!", id)
                    .green()
                    .bold()
            );
            Ok(())
        }
        PipelineCommands::Env { command } => handle_env_command(&client, command).await,
        PipelineCommands::Detail { command } => handle_detail_command(&client, command).await,
    }
}

async fn resolve(client: &LedgerClient, pipeline: &str) -> Result<i64> {
    resolve_pipeline_id(client, &PipelineRef::parse(pipeline)).await
}

async fn handle_env_command(client: &LedgerClient, command: EnvCommands) -> Result<()> {
    match command {
        EnvCommands::Add { pipeline, env_code } => {
            let id = resolve(client, &pipeline).await?;
            let env = client.add_environment(id, &env_code).await?;
            println!(
                "{}",
                format!(
                    "✓ Pipeline {} bound to {} (environment id {})",
                    id, env.env_code, env.environment_id
                )
                .green()
                .bold()
            );
            Ok(())
        }
        EnvCommands::List { pipeline } => {
            let id = resolve(client, &pipeline).await?;
            let envs = client.list_environments(id).await?;
            if envs.is_empty() {
                println!("{}", format!("No environments for pipeline {}.", id).yellow());
            }
            for env in envs {
                println!(
                    "  {} {:<8} id {}",
                    "▸".cyan(),
                    env.env_code.bold(),
                    env.environment_id.to_string().dimmed()
                );
            }
            Ok(())
        }
        EnvCommands::Remove { environment_id } => {
            client.remove_environment(environment_id).await?;
            println!(
                "{}",
                format!("✓ Environment {} removed", environment_id)
                    .green()
                    .bold()
            );
            Ok(())
        }
    }
}

async fn handle_detail_command(client: &LedgerClient, command: DetailCommands) -> Result<()> {
    match command {
        DetailCommands::Add { pipeline, args } => {
            let id = resolve(client, &pipeline).await?;
            let detail = client.add_detail(id, args.into()).await?;
            println!("{}", "✓ Detail added".green().bold());
            print_detail(&detail);
            Ok(())
        }
        DetailCommands::List { pipeline } => {
            let id = resolve(client, &pipeline).await?;
            let details = client.list_details(id).await?;
            if details.is_empty() {
                println!("{}", format!("No details for pipeline {}.", id).yellow());
            }
            for detail in &details {
                print_detail(detail);
            }
            Ok(())
        }
        DetailCommands::Update { detail_id, args } => {
            let detail = client.update_detail(detail_id, args.into()).await?;
            println!("{}", "✓ Detail updated".green().bold());
            print_detail(&detail);
            Ok(())
        }
        DetailCommands::Delete { detail_id } => {
            client.delete_detail(detail_id).await?;
            println!("{}", format!("✓ Detail {} deleted", detail_id).green().bold());
            Ok(())
        }
    }
}

/// List all pipelines
async fn list_pipelines(client: &LedgerClient) -> Result<()> {
    let pipelines = client.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} pipeline(s):", pipelines.len()).bold()
        );
        println!();
        for pipeline in pipelines {
            print_pipeline_summary(&pipeline);
        }
    }

    Ok(())
}

/// Show a pipeline with its environments and details
async fn show_pipeline(client: &LedgerClient, pipeline: &str) -> Result<()> {
    let id = resolve(client, pipeline).await?;

    let pipeline = client.get_pipeline(id).await?;
    let envs = client.list_environments(id).await?;
    let details = client.list_details(id).await?;

    print_pipeline_details(&pipeline);

    if !envs.is_empty() {
        println!("\n{}", "Environments:".bold());
        for env in &envs {
            println!(
                "  {} {:<8} id {}",
                "▸".cyan(),
                env.env_code,
                env.environment_id.to_string().dimmed()
            );
        }
    }

    if !details.is_empty() {
        println!("\n{}", "Details:".bold());
        for detail in &details {
            print_detail(detail);
        }
    }

    Ok(())
}

/// Print a pipeline summary
fn print_pipeline_summary(pipeline: &PipelineSummary) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        pipeline.pipeline_name.bold(),
        super::active_marker(pipeline.is_active)
    );
    println!("    ID:      {}", pipeline.pipeline_id.to_string().dimmed());
    println!(
        "    Type:    {} / {}",
        pipeline.pipeline_type, pipeline.pipeline_status
    );
    if let Some(tag) = &pipeline.tag {
        println!("    Tag:     {}", tag.cyan());
    }
    println!("    Runs:    {}", pipeline.run_count);
    if let Some(desc) = &pipeline.description {
        println!("    Description: {}", desc.dimmed());
    }
    println!();
}

/// Print detailed pipeline information
fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!("  ID:          {}", pipeline.pipeline_id.to_string().cyan());
    println!("  Name:        {}", pipeline.pipeline_name.bold());
    println!("  Type:        {}", pipeline.pipeline_type);
    println!("  Status:      {}", pipeline.pipeline_status);
    println!("  Active:      {}", super::active_marker(pipeline.is_active));
    if let Some(tag) = &pipeline.tag {
        println!("  Tag:         {}", tag.cyan());
    }
    if let Some(desc) = &pipeline.description {
        println!("  Description: {}", desc);
    }
    println!("  Created:     {}", super::format_ts(&pipeline.created_at));
}

fn print_detail(detail: &PipelineDetail) {
    println!(
        "  {} [{}] {} {}",
        detail.detail_id.to_string().dimmed(),
        detail.env_code.cyan(),
        detail.detail_type.bold(),
        detail.detail_desc
    );
    if let Some(data) = &detail.detail_data {
        println!("      {}", data.dimmed());
    }
}
