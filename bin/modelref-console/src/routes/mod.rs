//! Axum router construction.
//!
//! [`build`] assembles the complete console router:
//! - Middleware layers (CORS, per-request trace-ID span)
//! - Optional Swagger UI (disable with `MODELREF_ENABLE_SWAGGER=false`)
//! - Health route
//! - `/api` routes for categories, models and audit views

mod audit;
mod categories;
pub mod doc;
mod health;
mod models;

use std::sync::Arc;

use axum::{middleware, Router};
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the console.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(categories::router())
        .merge(models::router())
        .merge(audit::router());

    let mut app = Router::new()
        .merge(health::router())
        .nest("/api", api_router);

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app.layer(cors::cors_layer(&state))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
