use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde_json::Value;

use crate::auth::decode_jwt;
use crate::database::models::User;
use crate::error::ApiError;
use crate::server::AppState;
use crate::tenancy::{ActingUser, Caller};
use crate::types::Collection;

/// Resolves the request's [`Caller`] and stores it in the request extensions.
///
/// No Authorization header means an anonymous caller; the access rules decide
/// what that may do. A present but invalid token is rejected outright. The user
/// record is loaded on every request so role and membership changes apply
/// immediately.
pub async fn resolve_caller_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = match extract_jwt_from_headers(&headers)? {
        None => Caller::Anonymous,
        Some(token) => {
            let claims = decode_jwt(&token, state.auth_secret.as_deref())?;
            let user = load_user(&state, &claims.sub).await?;
            tracing::debug!("Authenticated {} ({:?})", user.email, user.role);
            Caller::User(user)
        }
    };

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

async fn load_user(state: &AppState, id: &str) -> Result<ActingUser, ApiError> {
    let record = state
        .service
        .store()
        .find_by_id(Collection::Users, id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Token subject no longer exists"))?;

    let user: User = serde_json::from_value(Value::Object(record)).map_err(|e| {
        tracing::error!("Stored user {} is malformed: {}", id, e);
        ApiError::internal_server_error("Stored user record is malformed")
    })?;
    Ok(ActingUser::from(user))
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(auth_header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        Some(_) => Err(ApiError::unauthorized("Empty JWT token")),
        None => Err(ApiError::unauthorized("Authorization header must use Bearer token format")),
    }
}
