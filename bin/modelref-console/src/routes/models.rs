//! Model reference CRUD routes.
//!
//! Writes take the record as a JSON body, parse and validate it locally, and
//! forward it with the caller's `apikey` header (or the configured key).

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};
use axum::{Json, Router};
use modelref_client::API_KEY_HEADER;
use modelref_types::{parse_record, ModelCategory, ModelRecord};
use serde_json::Value;
use tracing::info;
use utoipa::OpenApi;

use crate::error::ConsoleError;
use crate::schemas::ModelListParams;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_models, create_model, update_model, delete_model))]
pub struct ModelsApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/categories/{category}/models",
            get(list_models).post(create_model),
        )
        .route(
            "/categories/{category}/models/{name}",
            put(update_model).delete(delete_model),
        )
}

/// `apikey` header of the incoming request, if present and non-empty.
pub(crate) fn api_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// Records of a category, ordered by name.
#[utoipa::path(
    get,
    path = "/api/categories/{category}/models",
    tag = "models",
    params(
        ("category" = String, Path, description = "Category, e.g. `image_generation`"),
        ModelListParams,
    ),
    responses(
        (status = 200, description = "Reference records", body = Value),
        (status = 404, description = "Unknown category"),
        (status = 502, description = "Reference service unavailable"),
    )
)]
pub async fn list_models(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<ModelListParams>,
) -> Result<Json<Vec<ModelRecord>>, ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    let records = if params.legacy.unwrap_or(false) {
        state.api.list_legacy_models(category).await?
    } else {
        state.api.list_models(category).await?
    };
    Ok(Json(records))
}

/// Create a record. The body is a record JSON document whose `record_type`
/// matches the category.
#[utoipa::path(
    post,
    path = "/api/categories/{category}/models",
    tag = "models",
    params(("category" = String, Path, description = "Category of the new record")),
    request_body(content = Value, description = "Record JSON"),
    responses(
        (status = 201, description = "Record created", body = Value),
        (status = 400, description = "Malformed or invalid record"),
        (status = 401, description = "No API key available"),
        (status = 502, description = "Reference service unavailable"),
    )
)]
pub async fn create_model(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<ModelRecord>), ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    let record = parse_record(category, &body)?;

    let created = state
        .api
        .create_model(category, &record, api_key(&headers))
        .await?;
    state.snapshots.invalidate(category);
    info!(%category, name = %created.name, "model reference created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace a record. The record's name must match the path.
#[utoipa::path(
    put,
    path = "/api/categories/{category}/models/{name}",
    tag = "models",
    params(
        ("category" = String, Path, description = "Category of the record"),
        ("name" = String, Path, description = "Record name, percent-encoded"),
    ),
    request_body(content = Value, description = "Record JSON"),
    responses(
        (status = 200, description = "Record updated", body = Value),
        (status = 400, description = "Malformed or invalid record"),
        (status = 401, description = "No API key available"),
        (status = 404, description = "Unknown category or record"),
        (status = 502, description = "Reference service unavailable"),
    )
)]
pub async fn update_model(
    State(state): State<Arc<AppState>>,
    Path((category, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ModelRecord>, ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    let record = parse_record(category, &body)?;
    if record.name != name {
        return Err(ConsoleError::BadRequest(format!(
            "record name '{}' does not match '{name}'",
            record.name
        )));
    }

    let updated = state
        .api
        .update_model(category, &name, &record, api_key(&headers))
        .await?;
    state.snapshots.invalidate(category);
    info!(%category, %name, "model reference updated");
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{category}/models/{name}",
    tag = "models",
    params(
        ("category" = String, Path, description = "Category of the record"),
        ("name" = String, Path, description = "Record name, percent-encoded"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 401, description = "No API key available"),
        (status = 404, description = "Unknown category or record"),
        (status = 502, description = "Reference service unavailable"),
    )
)]
pub async fn delete_model(
    State(state): State<Arc<AppState>>,
    Path((category, name)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    state
        .api
        .delete_model(category, &name, api_key(&headers))
        .await?;
    state.snapshots.invalidate(category);
    info!(%category, %name, "model reference deleted");
    Ok(StatusCode::NO_CONTENT)
}
