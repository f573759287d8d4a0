mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{Fixture, TEST_SECRET};
use tenant_cms::auth::{generate_jwt, Claims};
use tenant_cms::config::RolloutPhase;
use tenant_cms::server::{app, AppState};
use tenant_cms::tenancy::{Caller, Role};

struct Site {
    router: Router,
    acme: String,
    globex_page: String,
    editor: String,
    viewer: String,
}

async fn site() -> Result<Site> {
    let fx = Fixture::new(RolloutPhase::Contract);
    let acme = fx.website("acme").await?;
    let globex = fx.website("globex").await?;
    fx.page("acme-home", Some(&acme)).await?;
    let globex_page = fx.page("globex-home", Some(&globex)).await?;

    let editor = token_for(&fx.user("editor@acme.test", Role::Editor, &[&acme]).await?)?;
    let viewer = token_for(&fx.user("viewer@acme.test", Role::Viewer, &[&acme]).await?)?;

    let router = app(AppState::new(fx.service.clone(), Some(TEST_SECRET.to_string())));
    Ok(Site { router, acme, globex_page, editor, viewer })
}

fn token_for(caller: &Caller) -> Result<String> {
    let id = caller.user().map(|u| u.id.clone()).unwrap_or_default();
    Ok(generate_jwt(&Claims::new(id), Some(TEST_SECRET))?)
}

async fn send(router: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, value))
}

#[tokio::test]
async fn health_is_public() -> Result<()> {
    let site = site().await?;
    let (status, body) = send(&site.router, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["rollout_phase"], "contract");
    Ok(())
}

#[tokio::test]
async fn requests_without_a_token_are_unauthenticated() -> Result<()> {
    let site = site().await?;
    let (status, body) = send(&site.router, Method::GET, "/api/pages", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn invalid_tokens_are_rejected() -> Result<()> {
    let site = site().await?;
    let forged = generate_jwt(&Claims::new("nobody"), Some("some-other-secret"))?;
    let (status, _) = send(&site.router, Method::GET, "/api/pages", Some(&forged), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let orphan = generate_jwt(&Claims::new("deleted-user"), Some(TEST_SECRET))?;
    let (status, _) = send(&site.router, Method::GET, "/api/pages", Some(&orphan), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn listing_returns_only_the_callers_tenant() -> Result<()> {
    let site = site().await?;
    let (status, body) = send(&site.router, Method::GET, "/api/pages", Some(&site.editor), None).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["docs"][0]["slug"], "acme-home");
    Ok(())
}

#[tokio::test]
async fn find_accepts_a_filter_body() -> Result<()> {
    let site = site().await?;
    let filter = json!({ "where": { "slug": { "$in": ["acme-home", "globex-home"] } }, "order": "slug desc" });
    let (status, body) = send(&site.router, Method::POST, "/api/find/pages", Some(&site.viewer), Some(filter)).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn out_of_scope_records_are_not_found() -> Result<()> {
    let site = site().await?;
    let uri = format!("/api/pages/{}", site.globex_page);
    let (status, body) = send(&site.router, Method::GET, &uri, Some(&site.editor), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND, "{}", body);

    let (status, body) = send(&site.router, Method::PATCH, &uri, Some(&site.editor), Some(json!({ "title": "x" }))).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    Ok(())
}

#[tokio::test]
async fn editors_create_content_in_their_default_website() -> Result<()> {
    let site = site().await?;
    let page = json!({ "title": "About", "slug": "about" });
    let (status, body) = send(&site.router, Method::POST, "/api/pages", Some(&site.editor), Some(page)).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["website"], json!(site.acme));
    Ok(())
}

#[tokio::test]
async fn viewers_are_forbidden_from_writing() -> Result<()> {
    let site = site().await?;
    let page = json!({ "title": "About", "slug": "about" });
    let (status, body) = send(&site.router, Method::POST, "/api/pages", Some(&site.viewer), Some(page)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);
    assert_eq!(body["code"], "FORBIDDEN");
    Ok(())
}

#[tokio::test]
async fn invalid_writes_are_bad_requests() -> Result<()> {
    let site = site().await?;
    let (status, body) = send(&site.router, Method::POST, "/api/pages", Some(&site.editor), Some(json!({ "title": "No slug" }))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);

    let (status, _) = send(&site.router, Method::GET, "/api/pages?where=not-json", Some(&site.editor), None).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn unknown_collections_are_not_found() -> Result<()> {
    let site = site().await?;
    let (status, _) = send(&site.router, Method::GET, "/api/widgets", Some(&site.editor), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}
