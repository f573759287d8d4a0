use serde::Serialize;
use serde_json::{json, Value};

use super::MigrationError;
use crate::config::AppConfig;
use crate::database::models::User;
use crate::database::store::{record_id, Record};
use crate::filter::FilterData;
use crate::observer::ObserverError;
use crate::services::ContentService;
use crate::tenancy::{Caller, Role, WebsiteId};
use crate::types::Collection;

const FALLBACK_DOMAIN: &str = "example.com";

#[derive(Debug, Clone)]
pub struct BackfillOptions {
    pub primary_domain: String,
    pub batch_size: usize,
}

impl BackfillOptions {
    /// Fails before anything is read when the signing secret is absent
    pub fn from_config(config: &AppConfig) -> Result<Self, MigrationError> {
        if config.security.auth_secret.as_deref().map_or(true, str::is_empty) {
            return Err(MigrationError::MissingSecret);
        }
        Ok(Self {
            primary_domain: config
                .migration
                .primary_domain
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| FALLBACK_DOMAIN.to_string()),
            batch_size: config.migration.batch_size.max(1) as usize,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackfillReport {
    pub website_id: String,
    pub website_name: String,
    pub website_domain: String,
    pub website_created: bool,
    pub users_migrated: u64,
    pub users_skipped: u64,
    pub pages_migrated: u64,
    pub pages_skipped: u64,
    pub media_migrated: u64,
    pub media_skipped: u64,
}

/// One-time population of tenancy fields on single-tenant data.
///
/// Records are visited in `created_at asc, id asc` order. Already migrated
/// records are skipped without a write, so a second run changes nothing.
pub struct Backfill {
    service: ContentService,
    options: BackfillOptions,
}

impl Backfill {
    pub fn new(service: ContentService, options: BackfillOptions) -> Self {
        Self { service, options }
    }

    pub async fn run(&self) -> Result<BackfillReport, MigrationError> {
        tracing::info!("Starting multi-tenant backfill");
        let mut report = BackfillReport::default();

        let website = self.locate_website(&mut report).await?;
        self.migrate_users(&website, &mut report).await?;
        let (migrated, skipped) = self.migrate_content(Collection::Pages, &website).await?;
        report.pages_migrated = migrated;
        report.pages_skipped = skipped;
        let (migrated, skipped) = self.migrate_content(Collection::Media, &website).await?;
        report.media_migrated = migrated;
        report.media_skipped = skipped;

        tracing::info!(
            "Backfill complete: website {} ({}), users {}/{} skipped, pages {}/{} skipped, media {}/{} skipped",
            report.website_name,
            report.website_domain,
            report.users_migrated,
            report.users_skipped,
            report.pages_migrated,
            report.pages_skipped,
            report.media_migrated,
            report.media_skipped
        );
        Ok(report)
    }

    async fn locate_website(&self, report: &mut BackfillReport) -> Result<WebsiteId, MigrationError> {
        let existing = self
            .service
            .find(&Caller::System, Collection::Websites, Self::ordered().page(1, 0))
            .await?;

        let (website, created) = match existing.docs.into_iter().next() {
            Some(website) => {
                tracing::info!("Found existing website {:?}", website.get("name"));
                (website, false)
            }
            None => {
                let data = json!({
                    "name": "Primary Website",
                    "domain": self.options.primary_domain,
                    "slug": "primary",
                    "status": "active",
                });
                let website = self.service.create(&Caller::System, Collection::Websites, into_record(data)).await?;
                tracing::info!("Created default website on {}", self.options.primary_domain);
                (website, true)
            }
        };

        let id = record_id(&website)
            .map(WebsiteId::new)
            .ok_or_else(|| ObserverError::PipelineError("website record has no id".to_string()))?;

        report.website_id = id.to_string();
        report.website_name = text(&website, "name");
        report.website_domain = text(&website, "domain");
        report.website_created = created;
        Ok(id)
    }

    async fn migrate_users(&self, website: &WebsiteId, report: &mut BackfillReport) -> Result<(), MigrationError> {
        let mut offset = 0usize;
        loop {
            let batch = self.batch(Collection::Users, offset).await?;
            if batch.is_empty() {
                return Ok(());
            }
            offset += batch.len();

            for record in batch {
                let user: User = serde_json::from_value(Value::Object(record))
                    .map_err(|e| ObserverError::ValidationError(format!("Invalid users record: {}", e)))?;

                if user.is_migrated() {
                    tracing::debug!("Skipping user {} (already migrated)", user.email);
                    report.users_skipped += 1;
                    continue;
                }

                let role = if report.users_migrated == 0 {
                    Role::SuperAdmin
                } else {
                    Role::WebsiteAdmin
                };

                let changes = json!({
                    "role": role,
                    "websites": [website],
                    "default_website": website,
                });
                self.service
                    .update(&Caller::System, Collection::Users, &user.id, into_record(changes))
                    .await?;

                tracing::info!("Migrated user {} (role: {})", user.email, role);
                report.users_migrated += 1;
            }
        }
    }

    async fn migrate_content(&self, collection: Collection, website: &WebsiteId) -> Result<(u64, u64), MigrationError> {
        let (mut migrated, mut skipped) = (0u64, 0u64);
        let mut offset = 0usize;
        loop {
            let batch = self.batch(collection, offset).await?;
            if batch.is_empty() {
                tracing::info!("Migrated {} {} record(s), skipped {}", migrated, collection, skipped);
                return Ok((migrated, skipped));
            }
            offset += batch.len();

            for record in batch {
                let Some(id) = record_id(&record) else {
                    continue;
                };
                if record.get("website").and_then(WebsiteId::from_reference).is_some() {
                    tracing::debug!("Skipping {} {} (already assigned)", collection, id);
                    skipped += 1;
                    continue;
                }

                self.service
                    .update(&Caller::System, collection, id, into_record(json!({ "website": website })))
                    .await?;
                tracing::debug!("Assigned {} {} to website {}", collection, id, website);
                migrated += 1;
            }
        }
    }

    async fn batch(&self, collection: Collection, offset: usize) -> Result<Vec<Record>, MigrationError> {
        let filter = Self::ordered().page(self.options.batch_size as i32, offset as i32);
        Ok(self.service.find(&Caller::System, collection, filter).await?.docs)
    }

    fn ordered() -> FilterData {
        FilterData::default().order_by(json!("created_at asc, id asc"))
    }
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn text(record: &Record, field: &str) -> String {
    record.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}
