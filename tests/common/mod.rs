#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use tenant_cms::config::RolloutPhase;
use tenant_cms::database::models::User;
use tenant_cms::database::{MemoryStore, Record, Store};
use tenant_cms::services::ContentService;
use tenant_cms::tenancy::{ActingUser, Caller, Role};
use tenant_cms::types::Collection;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap_or_default()
}

pub fn id_of(record: &Record) -> String {
    record.get("id").and_then(Value::as_str).unwrap_or_default().to_string()
}

/// In-memory service seeded through the system caller
pub struct Fixture {
    pub service: ContentService,
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub fn new(phase: RolloutPhase) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            service: ContentService::new(store.clone(), phase),
            store,
        }
    }

    /// Write a row straight to the store, as a pre-tenancy deployment left it
    pub async fn legacy(&self, collection: Collection, id: &str, created_at: &str, fields: Value) -> Result<()> {
        let mut row = record(fields);
        row.insert("id".to_string(), json!(id));
        row.insert("created_at".to_string(), json!(created_at));
        row.insert("updated_at".to_string(), json!(created_at));
        self.store.insert(collection, row).await?;
        Ok(())
    }

    pub async fn website(&self, slug: &str) -> Result<String> {
        let website = self
            .service
            .create(
                &Caller::System,
                Collection::Websites,
                record(json!({ "name": slug, "domain": format!("{}.test", slug), "slug": slug })),
            )
            .await
            .with_context(|| format!("failed to seed website {}", slug))?;
        Ok(id_of(&website))
    }

    /// Seed a user and return it as an authenticated caller
    pub async fn user(&self, email: &str, role: Role, websites: &[&str]) -> Result<Caller> {
        let mut data = record(json!({ "email": email, "role": role, "websites": websites }));
        if let Some(first) = websites.first() {
            data.insert("default_website".to_string(), json!(first));
        }

        let stored = self
            .service
            .create(&Caller::System, Collection::Users, data)
            .await
            .with_context(|| format!("failed to seed user {}", email))?;
        caller_from(stored)
    }

    /// Caller for a user row written with [`Fixture::legacy`]
    pub async fn legacy_caller(&self, id: &str) -> Result<Caller> {
        let stored = self.store.find_by_id(Collection::Users, id).await?.context("legacy user missing")?;
        caller_from(stored)
    }

    /// Re-read a user so the caller reflects its current stored state
    pub async fn reload(&self, caller: &Caller) -> Result<Caller> {
        let id = caller.user().map(|u| u.id.clone()).context("not a user caller")?;
        let stored = self.service.find_by_id(&Caller::System, Collection::Users, &id).await?;
        caller_from(stored)
    }

    pub async fn page(&self, slug: &str, website: Option<&str>) -> Result<String> {
        let mut data = record(json!({ "title": slug, "slug": slug }));
        if let Some(website) = website {
            data.insert("website".to_string(), json!(website));
        }
        let page = self
            .service
            .create(&Caller::System, Collection::Pages, data)
            .await
            .with_context(|| format!("failed to seed page {}", slug))?;
        Ok(id_of(&page))
    }

    pub async fn media(&self, alt: &str, website: Option<&str>) -> Result<String> {
        let mut data = record(json!({ "alt": alt }));
        if let Some(website) = website {
            data.insert("website".to_string(), json!(website));
        }
        let media = self.service.create(&Caller::System, Collection::Media, data).await?;
        Ok(id_of(&media))
    }
}

pub fn caller_from(stored: Record) -> Result<Caller> {
    let user: User = serde_json::from_value(Value::Object(stored)).context("stored user did not deserialize")?;
    Ok(Caller::User(ActingUser::from(user)))
}
