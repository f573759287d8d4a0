use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;
use crate::migration::{MigrationError, Migrator};

#[derive(Subcommand)]
pub enum MigrateCommands {
    #[command(about = "Apply pending migrations")]
    Up {
        #[arg(long, help = "Stop after this migration")]
        to: Option<String>,
    },

    #[command(about = "Revert the most recently applied migration")]
    Down,

    #[command(about = "List migrations and when they were applied")]
    Status,
}

pub async fn handle(cmd: MigrateCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let migrator = Migrator::new(DatabaseManager::main_pool().await?);

    match cmd {
        MigrateCommands::Up { to } => match migrator.up(to.as_deref()).await {
            Ok(applied) if applied.is_empty() => output_success(output_format, "Schema is up to date", None),
            Ok(applied) => {
                if let OutputFormat::Text = output_format {
                    for name in &applied {
                        println!("  applied {}", name);
                    }
                }
                output_success(
                    output_format,
                    &format!("Applied {} migration(s)", applied.len()),
                    Some(json!({ "applied": applied })),
                )
            }
            Err(MigrationError::ContractPrecondition(readiness)) => {
                output_error(
                    output_format,
                    "Contract migration refused, run the backfill first",
                    Some(json!({ "readiness": readiness })),
                )?;
                Err(MigrationError::ContractPrecondition(readiness).into())
            }
            Err(e) => Err(e.into()),
        },
        MigrateCommands::Down => match migrator.down().await? {
            Some(name) => output_success(output_format, &format!("Reverted {}", name), Some(json!({ "reverted": name }))),
            None => output_success(output_format, "Nothing to revert", None),
        },
        MigrateCommands::Status => {
            let status = migrator.status().await?;
            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json!({ "migrations": status }))?),
                OutputFormat::Text => {
                    println!("{:<40} {}", "MIGRATION", "APPLIED");
                    println!("{}", "-".repeat(70));
                    for m in &status {
                        let applied = m
                            .applied_at
                            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_else(|| "pending".to_string());
                        println!("{:<40} {}", m.name, applied);
                    }
                }
            }
            Ok(())
        }
    }
}
