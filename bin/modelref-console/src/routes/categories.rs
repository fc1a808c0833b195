//! Category listing and the reference service's own OpenAPI document.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use utoipa::OpenApi;

use crate::error::ConsoleError;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_categories, openapi_schema))]
pub struct CategoriesApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/openapi-schema", get(openapi_schema))
}

/// Category names known to the reference service.
#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "categories",
    responses(
        (status = 200, description = "Category names", body = Vec<String>),
        (status = 502, description = "Reference service unavailable"),
    )
)]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ConsoleError> {
    Ok(Json(state.api.list_categories().await?))
}

/// The reference service's OpenAPI document, passed through unchanged.
#[utoipa::path(
    get,
    path = "/api/openapi-schema",
    tag = "categories",
    responses(
        (status = 200, description = "Upstream OpenAPI document", body = Value),
        (status = 502, description = "Reference service unavailable"),
    )
)]
pub async fn openapi_schema(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ConsoleError> {
    Ok(Json(state.api.openapi_schema().await?))
}
