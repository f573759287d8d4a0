mod common;

use anyhow::Result;
use serde_json::json;

use common::{id_of, record, Fixture};
use tenant_cms::config::RolloutPhase;
use tenant_cms::filter::FilterData;
use tenant_cms::observer::ObserverError;
use tenant_cms::tenancy::{Caller, Role};
use tenant_cms::types::Collection;

/// Two tenants with one page each
async fn two_tenants(phase: RolloutPhase) -> Result<(Fixture, String, String, String, String)> {
    let fx = Fixture::new(phase);
    let acme = fx.website("acme").await?;
    let globex = fx.website("globex").await?;
    let acme_page = fx.page("acme-home", Some(&acme)).await?;
    let globex_page = fx.page("globex-home", Some(&globex)).await?;
    Ok((fx, acme, globex, acme_page, globex_page))
}

#[tokio::test]
async fn reads_are_scoped_to_the_callers_websites() -> Result<()> {
    let (fx, acme, _globex, acme_page, _globex_page) = two_tenants(RolloutPhase::Contract).await?;
    let editor = fx.user("editor@acme.test", Role::Editor, &[&acme]).await?;

    let page = fx.service.find(&editor, Collection::Pages, FilterData::default()).await?;
    assert_eq!(page.total, 1, "editor should see only acme pages: {:?}", page.docs);
    assert_eq!(id_of(&page.docs[0]), acme_page);
    Ok(())
}

#[tokio::test]
async fn caller_filters_cannot_widen_the_scope() -> Result<()> {
    let (fx, acme, globex, _acme_page, globex_page) = two_tenants(RolloutPhase::Contract).await?;
    let viewer = fx.user("viewer@acme.test", Role::Viewer, &[&acme]).await?;

    let asked = FilterData::with_where(json!({ "$or": [{ "website": globex }, { "id": globex_page }] }));
    let page = fx.service.find(&viewer, Collection::Pages, asked).await?;
    assert!(page.docs.is_empty(), "scope leaked: {:?}", page.docs);
    Ok(())
}

#[tokio::test]
async fn super_admin_sees_every_tenant() -> Result<()> {
    let (fx, _acme, _globex, _a, _g) = two_tenants(RolloutPhase::Contract).await?;
    let root_site = fx.website("root").await?;
    let root = fx.user("root@example.com", Role::SuperAdmin, &[&root_site]).await?;

    let pages = fx.service.find(&root, Collection::Pages, FilterData::default()).await?;
    assert_eq!(pages.total, 2);
    let websites = fx.service.find(&root, Collection::Websites, FilterData::default()).await?;
    assert_eq!(websites.total, 3);
    Ok(())
}

#[tokio::test]
async fn websites_are_managed_by_super_admins_only() -> Result<()> {
    let (fx, acme, _globex, _a, _g) = two_tenants(RolloutPhase::Contract).await?;
    let admin = fx.user("admin@acme.test", Role::WebsiteAdmin, &[&acme]).await?;

    let err = fx.service.find(&admin, Collection::Websites, FilterData::default()).await.unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);

    let err = fx
        .service
        .create(&admin, Collection::Websites, record(json!({ "name": "x", "domain": "x.test", "slug": "x" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);
    Ok(())
}

#[tokio::test]
async fn viewers_cannot_write_content() -> Result<()> {
    let (fx, acme, _globex, acme_page, _g) = two_tenants(RolloutPhase::Contract).await?;
    let viewer = fx.user("viewer@acme.test", Role::Viewer, &[&acme]).await?;

    let err = fx
        .service
        .create(&viewer, Collection::Pages, record(json!({ "title": "New", "slug": "new" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);

    let err = fx
        .service
        .update(&viewer, Collection::Pages, &acme_page, record(json!({ "title": "Changed" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);
    Ok(())
}

#[tokio::test]
async fn created_content_is_owned_by_the_default_website() -> Result<()> {
    let (fx, acme, globex, _a, _g) = two_tenants(RolloutPhase::Contract).await?;
    let editor = fx.user("editor@acme.test", Role::Editor, &[&acme]).await?;

    let created = fx
        .service
        .create(&editor, Collection::Pages, record(json!({ "title": "About", "slug": "about", "website": globex })))
        .await?;
    assert_eq!(created["website"], json!(acme));

    let media = fx.service.create(&editor, Collection::Media, record(json!({ "alt": "Logo" }))).await?;
    assert_eq!(media["website"], json!(acme));
    Ok(())
}

#[tokio::test]
async fn super_admin_may_choose_the_owner() -> Result<()> {
    let (fx, acme, globex, _a, _g) = two_tenants(RolloutPhase::Contract).await?;
    let root = fx.user("root@example.com", Role::SuperAdmin, &[&acme]).await?;

    let created = fx
        .service
        .create(&root, Collection::Pages, record(json!({ "title": "Launch", "slug": "launch", "website": globex })))
        .await?;
    assert_eq!(created["website"], json!(globex));
    Ok(())
}

#[tokio::test]
async fn updates_keep_the_stored_owner() -> Result<()> {
    let (fx, acme, globex, acme_page, _g) = two_tenants(RolloutPhase::Contract).await?;
    let editor = fx.user("editor@acme.test", Role::Editor, &[&acme, &globex]).await?;

    let updated = fx
        .service
        .update(&editor, Collection::Pages, &acme_page, record(json!({ "title": "Moved?", "website": globex })))
        .await?;
    assert_eq!(updated["title"], "Moved?");
    assert_eq!(updated["website"], json!(acme));
    Ok(())
}

#[tokio::test]
async fn out_of_scope_writes_are_denied_and_reads_are_not_found() -> Result<()> {
    let (fx, acme, _globex, _a, globex_page) = two_tenants(RolloutPhase::Contract).await?;
    let admin = fx.user("admin@acme.test", Role::WebsiteAdmin, &[&acme]).await?;

    let err = fx
        .service
        .update(&admin, Collection::Pages, &globex_page, record(json!({ "title": "Hijacked" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);

    let err = fx.service.delete(&admin, Collection::Pages, &globex_page).await.unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);

    let err = fx.service.find_by_id(&admin, Collection::Pages, &globex_page).await.unwrap_err();
    assert!(matches!(err, ObserverError::NotFound(_)), "{:?}", err);

    let untouched = fx.service.find_by_id(&Caller::System, Collection::Pages, &globex_page).await?;
    assert_eq!(untouched["title"], "globex-home");
    Ok(())
}

#[tokio::test]
async fn delete_requires_website_admin() -> Result<()> {
    let (fx, acme, _globex, acme_page, _g) = two_tenants(RolloutPhase::Contract).await?;
    let editor = fx.user("editor@acme.test", Role::Editor, &[&acme]).await?;
    let admin = fx.user("admin@acme.test", Role::WebsiteAdmin, &[&acme]).await?;

    let err = fx.service.delete(&editor, Collection::Pages, &acme_page).await.unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);

    let removed = fx.service.delete(&admin, Collection::Pages, &acme_page).await?;
    assert_eq!(id_of(&removed), acme_page);
    assert!(fx.service.find_by_id(&Caller::System, Collection::Pages, &acme_page).await.is_err());
    Ok(())
}

#[tokio::test]
async fn anonymous_callers_must_authenticate() -> Result<()> {
    let (fx, _acme, _globex, acme_page, _g) = two_tenants(RolloutPhase::Contract).await?;

    for result in [
        fx.service.find(&Caller::Anonymous, Collection::Media, FilterData::default()).await.map(|_| ()),
        fx.service.delete(&Caller::Anonymous, Collection::Pages, &acme_page).await.map(|_| ()),
    ] {
        assert_eq!(result.unwrap_err(), ObserverError::Unauthenticated);
    }
    Ok(())
}

#[tokio::test]
async fn user_directory_is_scoped_by_shared_membership() -> Result<()> {
    let (fx, acme, globex, _a, _g) = two_tenants(RolloutPhase::Contract).await?;
    let editor = fx.user("editor@acme.test", Role::Editor, &[&acme]).await?;
    fx.user("colleague@acme.test", Role::Viewer, &[&globex, &acme]).await?;
    fx.user("stranger@globex.test", Role::Viewer, &[&globex]).await?;

    let users = fx.service.find(&editor, Collection::Users, FilterData::default()).await?;
    let mut emails: Vec<_> = users.docs.iter().filter_map(|u| u["email"].as_str()).collect();
    emails.sort_unstable();
    assert_eq!(emails, vec!["colleague@acme.test", "editor@acme.test"]);
    Ok(())
}

#[tokio::test]
async fn expand_phase_keeps_unassigned_content_visible() -> Result<()> {
    let fx = Fixture::new(RolloutPhase::Expand);
    let acme = fx.website("acme").await?;
    let globex = fx.website("globex").await?;
    fx.page("acme-home", Some(&acme)).await?;
    fx.page("globex-home", Some(&globex)).await?;
    fx.page("orphan", None).await?;
    let editor = fx.user("editor@acme.test", Role::Editor, &[&acme]).await?;

    let pages = fx.service.find(&editor, Collection::Pages, FilterData::default()).await?;
    let mut slugs: Vec<_> = pages.docs.iter().filter_map(|p| p["slug"].as_str()).collect();
    slugs.sort_unstable();
    assert_eq!(slugs, vec!["acme-home", "orphan"]);
    Ok(())
}

#[tokio::test]
async fn unmigrated_users_keep_access_during_expand_only() -> Result<()> {
    let fx = Fixture::new(RolloutPhase::Expand);
    let acme = fx.website("acme").await?;
    let page = fx.page("acme-home", Some(&acme)).await?;
    fx.legacy(Collection::Users, "legacy", "2024-01-01T00:00:00.000Z", json!({ "email": "legacy@example.com" }))
        .await?;
    let legacy = fx.legacy_caller("legacy").await?;

    let pages = fx.service.find(&legacy, Collection::Pages, FilterData::default()).await?;
    assert_eq!(pages.total, 1);
    fx.service
        .update(&legacy, Collection::Pages, &page, record(json!({ "title": "Still editable" })))
        .await?;

    let err = fx
        .service
        .create(&legacy, Collection::Pages, record(json!({ "title": "New", "slug": "new" })))
        .await
        .unwrap_err();
    assert!(matches!(err, ObserverError::AuthorizationDenied(_)), "{:?}", err);

    let contract = tenant_cms::services::ContentService::new(fx.store.clone(), RolloutPhase::Contract);
    let pages = contract.find(&legacy, Collection::Pages, FilterData::default()).await?;
    assert!(pages.docs.is_empty());
    Ok(())
}

#[tokio::test]
async fn only_super_admins_move_content_between_websites() -> Result<()> {
    let fx = Fixture::new(RolloutPhase::Contract);
    let acme = fx.website("acme").await?;
    let other = fx.website("other").await?;
    let admin = fx.user("admin-a@acme.test", Role::WebsiteAdmin, &[&acme]).await?;
    let root = fx.user("root@example.com", Role::SuperAdmin, &[&acme]).await?;

    let page = fx.service.create(&admin, Collection::Pages, record(json!({ "title": "Home", "slug": "home" }))).await?;
    assert_eq!(page["website"], json!(acme));
    let id = id_of(&page);

    let kept = fx.service.update(&admin, Collection::Pages, &id, record(json!({ "website": other }))).await?;
    assert_eq!(kept["website"], json!(acme));

    let moved = fx.service.update(&root, Collection::Pages, &id, record(json!({ "website": other }))).await?;
    assert_eq!(moved["website"], json!(other));
    Ok(())
}
