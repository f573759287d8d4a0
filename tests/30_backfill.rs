mod common;

use anyhow::Result;
use serde_json::json;

use common::{Fixture, TEST_SECRET};
use tenant_cms::config::{AppConfig, RolloutPhase};
use tenant_cms::migration::{Backfill, BackfillOptions, ContractReadiness, MigrationError};
use tenant_cms::tenancy::Caller;
use tenant_cms::types::Collection;

fn options(batch_size: u32) -> Result<BackfillOptions> {
    let mut config = AppConfig::development();
    config.security.auth_secret = Some(TEST_SECRET.to_string());
    config.migration.primary_domain = Some("cms.example.test".to_string());
    config.migration.batch_size = batch_size;
    Ok(BackfillOptions::from_config(&config)?)
}

/// Single-tenant data as it looked before the expand migration
async fn legacy_deployment() -> Result<Fixture> {
    let fx = Fixture::new(RolloutPhase::Expand);
    // Ids sort opposite to creation time so ordering by id alone would pick the wrong first user
    fx.legacy(Collection::Users, "u-c", "2024-01-01T00:00:00.000Z", json!({ "email": "founder@example.com" })).await?;
    fx.legacy(Collection::Users, "u-b", "2024-02-01T00:00:00.000Z", json!({ "email": "second@example.com" })).await?;
    fx.legacy(Collection::Users, "u-a", "2024-03-01T00:00:00.000Z", json!({ "email": "third@example.com" })).await?;
    for (id, slug) in [("p1", "home"), ("p2", "about"), ("p3", "contact")] {
        fx.legacy(
            Collection::Pages,
            id,
            "2024-01-05T00:00:00.000Z",
            json!({ "title": slug, "slug": slug, "status": "published", "layout": [] }),
        )
        .await?;
    }
    fx.legacy(Collection::Media, "m1", "2024-01-06T00:00:00.000Z", json!({ "alt": "Logo" })).await?;
    Ok(fx)
}

async fn role_of(fx: &Fixture, id: &str) -> Result<String> {
    let user = fx.service.find_by_id(&Caller::System, Collection::Users, id).await?;
    Ok(user["role"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn backfill_creates_the_primary_website_and_assigns_everything() -> Result<()> {
    let fx = legacy_deployment().await?;

    let before = ContractReadiness::check(fx.store.as_ref()).await?;
    assert_eq!(
        before,
        ContractReadiness { unmigrated_users: 3, unassigned_pages: 3, unassigned_media: 1 }
    );
    assert!(!before.is_ready());

    let report = Backfill::new(fx.service.clone(), options(2)?).run().await?;
    assert!(report.website_created);
    assert_eq!(report.website_name, "Primary Website");
    assert_eq!(report.website_domain, "cms.example.test");
    assert_eq!((report.users_migrated, report.users_skipped), (3, 0));
    assert_eq!((report.pages_migrated, report.pages_skipped), (3, 0));
    assert_eq!((report.media_migrated, report.media_skipped), (1, 0));

    let founder = fx.service.find_by_id(&Caller::System, Collection::Users, "u-c").await?;
    assert_eq!(founder["role"], "super-admin");
    assert_eq!(founder["websites"], json!([report.website_id]));
    assert_eq!(founder["default_website"], json!(report.website_id));
    assert_eq!(role_of(&fx, "u-b").await?, "website-admin");
    assert_eq!(role_of(&fx, "u-a").await?, "website-admin");

    let page = fx.service.find_by_id(&Caller::System, Collection::Pages, "p2").await?;
    assert_eq!(page["website"], json!(report.website_id));

    assert!(ContractReadiness::check(fx.store.as_ref()).await?.is_ready());
    Ok(())
}

#[tokio::test]
async fn backfill_is_idempotent() -> Result<()> {
    let fx = legacy_deployment().await?;
    let first = Backfill::new(fx.service.clone(), options(100)?).run().await?;
    let second = Backfill::new(fx.service.clone(), options(100)?).run().await?;

    assert!(!second.website_created);
    assert_eq!(second.website_id, first.website_id);
    assert_eq!((second.users_migrated, second.users_skipped), (0, 3));
    assert_eq!((second.pages_migrated, second.pages_skipped), (0, 3));
    assert_eq!((second.media_migrated, second.media_skipped), (0, 1));

    let websites = fx.service.find(&Caller::System, Collection::Websites, Default::default()).await?;
    assert_eq!(websites.total, 1);
    Ok(())
}

#[tokio::test]
async fn backfill_reuses_an_existing_website_and_replaces_partial_tenancy() -> Result<()> {
    let fx = legacy_deployment().await?;
    let (existing, other) = ("w-existing", "w-other");
    fx.legacy(
        Collection::Websites,
        existing,
        "2023-01-01T00:00:00.000Z",
        json!({ "name": "Existing", "domain": "existing.test", "slug": "existing", "status": "active" }),
    )
    .await?;
    fx.legacy(
        Collection::Websites,
        other,
        "2023-06-01T00:00:00.000Z",
        json!({ "name": "Other", "domain": "other.test", "slug": "other", "status": "active" }),
    )
    .await?;
    fx.legacy(
        Collection::Users,
        "u-0",
        "2023-12-01T00:00:00.000Z",
        json!({ "email": "partial@example.com", "role": "editor", "websites": [other] }),
    )
    .await?;
    fx.legacy(
        Collection::Pages,
        "p-owned",
        "2023-12-02T00:00:00.000Z",
        json!({ "title": "Owned", "slug": "owned", "status": "draft", "website": other }),
    )
    .await?;

    let report = Backfill::new(fx.service.clone(), options(100)?).run().await?;
    assert!(!report.website_created);
    assert_eq!(report.website_id, existing);
    assert_eq!(report.pages_skipped, 1);

    let partial = fx.service.find_by_id(&Caller::System, Collection::Users, "u-0").await?;
    assert_eq!(partial["role"], "super-admin");
    assert_eq!(partial["websites"], json!([existing]));
    assert_eq!(partial["default_website"], json!(existing));
    assert_eq!(role_of(&fx, "u-c").await?, "website-admin");

    let owned = fx.service.find_by_id(&Caller::System, Collection::Pages, "p-owned").await?;
    assert_eq!(owned["website"], json!(other));
    Ok(())
}

#[tokio::test]
async fn first_user_is_promoted_even_with_a_legacy_role() -> Result<()> {
    let fx = Fixture::new(RolloutPhase::Expand);
    fx.legacy(
        Collection::Users,
        "u1",
        "2024-01-01T00:00:00.000Z",
        json!({ "email": "owner@example.com", "role": "viewer" }),
    )
    .await?;
    fx.legacy(Collection::Users, "u2", "2024-02-01T00:00:00.000Z", json!({ "email": "staff@example.com" })).await?;

    let report = Backfill::new(fx.service.clone(), options(100)?).run().await?;
    assert_eq!(report.users_migrated, 2);
    assert_eq!(role_of(&fx, "u1").await?, "super-admin");
    assert_eq!(role_of(&fx, "u2").await?, "website-admin");

    let owner = fx.service.find_by_id(&Caller::System, Collection::Users, "u1").await?;
    assert_eq!(owner["websites"], json!([report.website_id]));
    Ok(())
}

#[tokio::test]
async fn backfill_refuses_to_start_without_a_signing_secret() {
    let mut config = AppConfig::development();
    config.security.auth_secret = None;
    assert!(matches!(BackfillOptions::from_config(&config), Err(MigrationError::MissingSecret)));

    config.security.auth_secret = Some(String::new());
    assert!(matches!(BackfillOptions::from_config(&config), Err(MigrationError::MissingSecret)));
}

#[tokio::test]
async fn primary_domain_falls_back_when_unset() -> Result<()> {
    let mut config = AppConfig::development();
    config.security.auth_secret = Some(TEST_SECRET.to_string());
    config.migration.primary_domain = None;
    let options = BackfillOptions::from_config(&config)?;
    assert_eq!(options.primary_domain, "example.com");

    let fx = Fixture::new(RolloutPhase::Expand);
    let report = Backfill::new(fx.service.clone(), options).run().await?;
    assert!(report.website_created);
    assert_eq!(report.website_domain, "example.com");
    assert_eq!(report.users_migrated, 0);
    Ok(())
}
