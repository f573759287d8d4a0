use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers;
use crate::middleware::resolve_caller_middleware;
use crate::services::ContentService;

/// Shared request state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub service: ContentService,
    /// Bearer token signing secret
    pub auth_secret: Option<Arc<str>>,
}

impl AppState {
    pub fn new(service: ContentService, auth_secret: Option<String>) -> Self {
        Self {
            service,
            auth_secret: auth_secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/find/:collection", post(handlers::find))
        .route("/api/:collection", get(handlers::list).post(handlers::create))
        .route(
            "/api/:collection/:id",
            get(handlers::get).patch(handlers::update).delete(handlers::delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), resolve_caller_middleware));

    let router = Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let security = &crate::config::config().security;
    if security.enable_cors {
        router.layer(cors_layer(&security.cors_origins))
    } else {
        router
    }
}

/// No configured origins means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
