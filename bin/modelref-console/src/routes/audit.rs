//! Audit view, refresh and CSV export routes.
//!
//! All three work off the stored snapshot for (category, preset, grouping);
//! search, tag, worker and sort parameters are applied per request.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use modelref_audit::export;
use modelref_types::ModelCategory;
use serde_json::Value;
use tracing::info;
use utoipa::OpenApi;

use crate::error::ConsoleError;
use crate::schemas::{AuditParams, AuditView, RefreshResponse};
use crate::snapshot::RefreshOutcome;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(get_audit, refresh_audit, export_audit),
    components(schemas(RefreshResponse))
)]
pub struct AuditApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories/{category}/audit", get(get_audit))
        .route("/categories/{category}/audit/refresh", post(refresh_audit))
        .route("/categories/{category}/audit/export.csv", get(export_audit))
}

/// Audit rows of a category after filtering and sorting.
///
/// When the statistics endpoint fails the view is still returned with
/// `degraded: true` and rows built from the reference records alone.
#[utoipa::path(
    get,
    path = "/api/categories/{category}/audit",
    tag = "audit",
    params(
        ("category" = String, Path, description = "Category, e.g. `text_generation`"),
        AuditParams,
    ),
    responses(
        (status = 200, description = "Audit report", body = Value),
        (status = 404, description = "Unknown category"),
        (status = 502, description = "Model listing unavailable"),
    )
)]
pub async fn get_audit(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<AuditParams>,
) -> Result<Json<AuditView>, ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    let snapshot = state.snapshots.get_or_fetch(params.key(category)).await?;
    let report = snapshot.report(&params.filter(), params.sort());
    Ok(Json(AuditView::new(&snapshot, report)))
}

/// Re-fetch models and statistics for one view.
#[utoipa::path(
    post,
    path = "/api/categories/{category}/audit/refresh",
    tag = "audit",
    params(
        ("category" = String, Path, description = "Category to refresh"),
        AuditParams,
    ),
    responses(
        (status = 200, description = "Snapshot replaced", body = RefreshResponse),
        (status = 404, description = "Unknown category"),
        (status = 409, description = "A refresh of this view is already running"),
        (status = 502, description = "Model listing unavailable"),
    )
)]
pub async fn refresh_audit(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<AuditParams>,
) -> Result<Json<RefreshResponse>, ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    match state.snapshots.refresh(params.key(category)).await? {
        RefreshOutcome::Refreshed(snapshot) => Ok(Json(RefreshResponse::from(&*snapshot))),
        RefreshOutcome::AlreadyRunning => Err(ConsoleError::AlreadyRunning),
    }
}

/// The visible rows as a CSV attachment named `model-audit-<category>.csv`.
#[utoipa::path(
    get,
    path = "/api/categories/{category}/audit/export.csv",
    tag = "audit",
    params(
        ("category" = String, Path, description = "Category to export"),
        AuditParams,
    ),
    responses(
        (status = 200, description = "CSV document", content_type = "text/csv"),
        (status = 404, description = "Unknown category"),
        (status = 502, description = "Model listing unavailable"),
    )
)]
pub async fn export_audit(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    Query(params): Query<AuditParams>,
) -> Result<impl IntoResponse, ConsoleError> {
    let category = ModelCategory::parse(&category)?;
    let snapshot = state.snapshots.get_or_fetch(params.key(category)).await?;
    let report = snapshot.report(&params.filter(), params.sort());
    info!(%category, rows = report.rows.len(), "exporting audit csv");

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export::file_name(category)),
        ),
    ];
    Ok((headers, report.to_csv()))
}
