//! Reference code command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use ledger_client::LedgerClient;
use ledger_core::domain::code::SystemCode;
use ledger_core::dto::code::{CreateCodeType, CreateSystemCode, UpdateSystemCode};

use crate::config::Config;

/// Code subcommands
#[derive(Subcommand)]
pub enum CodeCommands {
    /// List code types
    Types,
    /// Create a code type
    AddType {
        code_type: String,
        #[arg(short, long)]
        description: String,
    },
    /// List codes
    List {
        /// Only codes of this type
        #[arg(short = 't', long)]
        code_type: Option<String>,

        /// Hide inactive codes
        #[arg(long)]
        active_only: bool,
    },
    /// Create a code
    Add {
        code_type: String,
        common_cd: String,
        #[arg(short, long)]
        description: String,
        #[arg(long, default_value = "0")]
        sort_order: i32,
        /// Create the code inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Update a code's description, ordering or active flag
    Update {
        id: i64,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        sort_order: Option<i32>,
        #[arg(long)]
        active: Option<bool>,
    },
    /// Deactivate a code
    Deactivate { id: i64 },
    /// Delete an unreferenced code
    Delete { id: i64 },
    /// Resolve a code to its id
    Resolve { code_type: String, common_cd: String },
}

/// Handle code commands
pub async fn handle_code_command(command: CodeCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        CodeCommands::Types => list_code_types(&client).await,
        CodeCommands::AddType {
            code_type,
            description,
        } => {
            let created = client
                .create_code_type(CreateCodeType {
                    code_type_cd: code_type,
                    description,
                })
                .await?;
            println!(
                "{}",
                format!("✓ Code type {} created", created.code_type_cd)
                    .green()
                    .bold()
            );
            Ok(())
        }
        CodeCommands::List {
            code_type,
            active_only,
        } => list_codes(&client, code_type.as_deref(), active_only).await,
        CodeCommands::Add {
            code_type,
            common_cd,
            description,
            sort_order,
            inactive,
        } => {
            let req = CreateSystemCode {
                code_type_cd: code_type,
                common_cd,
                description,
                sort_order,
                is_active: !inactive,
            };
            let code = client.create_code(req).await?;
            println!("{}", "✓ Code created successfully!".green().bold());
            print_code(&code);
            Ok(())
        }
        CodeCommands::Update {
            id,
            description,
            sort_order,
            active,
        } => update_code(&client, id, description, sort_order, active).await,
        CodeCommands::Deactivate { id } => {
            client.deactivate_code(id).await?;
            println!("{}", format!("✓ Code {} deactivated", id).green().bold());
            Ok(())
        }
        CodeCommands::Delete { id } => {
            client.delete_code(id).await?;
            println!("{}", format!("✓ Code {} deleted", id).green().bold());
            Ok(())
        }
        CodeCommands::Resolve {
            code_type,
            common_cd,
        } => {
            let code_id = client.resolve_code(&code_type, &common_cd).await?;
            println!("{}", code_id);
            Ok(())
        }
    }
}

async fn list_code_types(client: &LedgerClient) -> Result<()> {
    let code_types = client.list_code_types().await?;

    if code_types.is_empty() {
        println!("{}", "No code types found.".yellow());
        return Ok(());
    }

    for code_type in code_types {
        println!(
            "  {} {:<28} {}",
            "▸".cyan(),
            code_type.code_type_cd.bold(),
            code_type.description.dimmed()
        );
    }

    Ok(())
}

async fn list_codes(client: &LedgerClient, code_type: Option<&str>, active_only: bool) -> Result<()> {
    let codes = client.list_codes(code_type, active_only).await?;

    if codes.is_empty() {
        println!("{}", "No codes found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} code(s):", codes.len()).bold());
    println!();

    let mut current_type: Option<&str> = None;
    for code in &codes {
        if current_type != Some(code.code_type_cd.as_str()) {
            println!("{}", code.code_type_cd.bold());
            current_type = Some(code.code_type_cd.as_str());
        }
        println!(
            "  {:>5}  {:<24} {:<8} {}",
            code.code_id.to_string().dimmed(),
            code.common_cd.cyan(),
            super::active_marker(code.is_active),
            code.description
        );
    }

    Ok(())
}

/// Apply partial edits on top of the current code
async fn update_code(
    client: &LedgerClient,
    id: i64,
    description: Option<String>,
    sort_order: Option<i32>,
    active: Option<bool>,
) -> Result<()> {
    let current = client.get_code(id).await?;

    let req = UpdateSystemCode {
        description: description.unwrap_or(current.description),
        sort_order: sort_order.unwrap_or(current.sort_order),
        is_active: active.unwrap_or(current.is_active),
    };

    let code = client.update_code(id, req).await?;
    println!("{}", "✓ Code updated successfully!".green().bold());
    print_code(&code);

    Ok(())
}

fn print_code(code: &SystemCode) {
    println!("  ID:          {}", code.code_id.to_string().cyan());
    println!("  Code:        {}/{}", code.code_type_cd, code.common_cd.bold());
    println!("  Description: {}", code.description);
    println!("  Sort order:  {}", code.sort_order);
    println!("  Status:      {}", super::active_marker(code.is_active));
}
