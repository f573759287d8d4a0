use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::config::config;
use crate::database::store::{Record, RecordPage};
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::{ApiResponse, ApiResult};
use crate::server::AppState;
use crate::tenancy::Caller;
use crate::types::Collection;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
    /// e.g. `created_at desc, title asc`
    pub sort: Option<String>,
    /// JSON-encoded where clause
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> Result<FilterData, ApiError> {
        let where_clause = self
            .where_clause
            .map(|raw| serde_json::from_str::<Value>(&raw))
            .transpose()
            .map_err(|e| ApiError::invalid_json(format!("Invalid where parameter: {}", e)))?;

        Ok(FilterData {
            where_clause,
            order: self.sort.map(Value::String),
            limit: Some(self.limit.unwrap_or(config().api.default_page_size as i32)),
            offset: self.offset,
            ..Default::default()
        })
    }
}

fn collection(slug: &str) -> Result<Collection, ApiError> {
    slug.parse().map_err(|_| ApiError::not_found(format!("Unknown collection: {}", slug)))
}

fn body(value: Value) -> Result<Record, ApiError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::bad_request("Request body must be a JSON object")),
    }
}

/// GET /api/:collection
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<RecordPage> {
    let page = state.service.find(&caller, collection(&slug)?, query.into_filter()?).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/find/:collection - filtered find with a FilterData body
pub async fn find(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
    Json(filter): Json<FilterData>,
) -> ApiResult<RecordPage> {
    let page = state.service.find(&caller, collection(&slug)?, filter).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/:collection
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(slug): Path<String>,
    Json(data): Json<Value>,
) -> ApiResult<Record> {
    let record = state.service.create(&caller, collection(&slug)?, body(data)?).await?;
    Ok(ApiResponse::created(record))
}

/// GET /api/:collection/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((slug, id)): Path<(String, String)>,
) -> ApiResult<Record> {
    let record = state.service.find_by_id(&caller, collection(&slug)?, &id).await?;
    Ok(ApiResponse::success(record))
}

/// PATCH /api/:collection/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((slug, id)): Path<(String, String)>,
    Json(data): Json<Value>,
) -> ApiResult<Record> {
    let record = state.service.update(&caller, collection(&slug)?, &id, body(data)?).await?;
    Ok(ApiResponse::success(record))
}

/// DELETE /api/:collection/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path((slug, id)): Path<(String, String)>,
) -> ApiResult<Record> {
    let record = state.service.delete(&caller, collection(&slug)?, &id).await?;
    Ok(ApiResponse::success(record))
}
