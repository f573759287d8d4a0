use std::sync::Arc;

use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::{DatabaseManager, PgStore};
use crate::migration::{Backfill, BackfillOptions, ContractReadiness};
use crate::services::ContentService;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    // Checked before touching the database
    let options = BackfillOptions::from_config(config)?;

    if let OutputFormat::Text = output_format {
        println!("Starting multi-tenant data migration");
        println!("  AUTH_SECRET: ***set***");
        println!("  PRIMARY_DOMAIN: {}", options.primary_domain);
    }

    let store = Arc::new(PgStore::new(DatabaseManager::main_pool().await?));
    let service = ContentService::new(store, config.tenancy.rollout_phase);
    let report = Backfill::new(service, options).run().await?;

    if let OutputFormat::Text = output_format {
        println!("{}", "=".repeat(50));
        println!(
            "Website: {} ({}){}",
            report.website_name,
            report.website_domain,
            if report.website_created { " [created]" } else { "" }
        );
        println!("Users migrated: {} (skipped {})", report.users_migrated, report.users_skipped);
        println!("Pages migrated: {} (skipped {})", report.pages_migrated, report.pages_skipped);
        println!("Media migrated: {} (skipped {})", report.media_migrated, report.media_skipped);
    }
    output_success(output_format, "Backfill completed", Some(json!({ "report": report })))
}

pub async fn contract_check(output_format: OutputFormat) -> anyhow::Result<()> {
    let store = PgStore::new(DatabaseManager::main_pool().await?);
    let readiness = ContractReadiness::check(&store).await?;

    if readiness.is_ready() {
        return output_success(output_format, "Ready for the contract migration", Some(json!({ "readiness": readiness })));
    }

    output_error(output_format, &format!("Not ready: {}", readiness), Some(json!({ "readiness": readiness })))?;
    anyhow::bail!("contract precondition not met: {}", readiness)
}
