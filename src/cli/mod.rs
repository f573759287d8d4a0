pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "cms")]
#[command(about = "Tenant CMS operator CLI - schema migrations, tenancy backfill and tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply, revert or inspect schema migrations")]
    Migrate {
        #[command(subcommand)]
        cmd: commands::migrate::MigrateCommands,
    },

    #[command(about = "Populate tenancy fields on existing users and content")]
    Backfill,

    #[command(about = "Report records that would block the contract migration")]
    ContractCheck,

    #[command(about = "Issue a bearer token for a user")]
    Token {
        #[arg(long, help = "User id to place in the token subject")]
        user: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate { cmd } => commands::migrate::handle(cmd, output_format).await,
        Commands::Backfill => commands::backfill::handle(output_format).await,
        Commands::ContractCheck => commands::backfill::contract_check(output_format).await,
        Commands::Token { user } => commands::token::handle(&user, output_format),
    }
}
