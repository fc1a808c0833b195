use crate::routes::{audit, categories, health, models};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(info(
    title = "modelref-console",
    description = "Model reference admin console API",
    version = "0.1.0"
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(categories::CategoriesApi::openapi());
    root.merge(models::ModelsApi::openapi());
    root.merge(audit::AuditApi::openapi());
    root
}
