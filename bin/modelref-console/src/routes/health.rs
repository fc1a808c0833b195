//! Console liveness plus a reachability check against the reference service.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;
use utoipa::{OpenApi, ToSchema};

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_health), components(schemas(HealthReport, Upstream)))]
pub struct HealthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(get_health))
}

#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Upstream {
    Reachable,
    Unreachable,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub base_url: String,
    pub upstream: Upstream,
}

/// Always 200 while the console runs; `upstream` tells whether the
/// reference service answered a category listing.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Console is up", body = HealthReport)
    )
)]
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    let upstream = match state.api.list_categories().await {
        Ok(_) => Upstream::Reachable,
        Err(e) => {
            warn!(error = %e, "reference service unreachable from health check");
            Upstream::Unreachable
        }
    };
    Json(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        base_url: state.config.base_url.clone(),
        upstream,
    })
}
