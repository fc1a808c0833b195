use async_trait::async_trait;
use modelref_types::{CategoryAuditResponse, ModelCategory, ModelRecord};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::query::AuditQuery;

/// Operations of the model reference service.
///
/// [`crate::ReferenceClient`] is the HTTP implementation; the console only
/// depends on this trait so it can run against any source of records.
#[async_trait]
pub trait ReferenceApi: Send + Sync + 'static {
    async fn list_categories(&self) -> Result<Vec<String>, ClientError>;

    /// Records of a category in the v2 shape, ordered by name.
    async fn list_models(&self, category: ModelCategory) -> Result<Vec<ModelRecord>, ClientError>;

    /// Records of a category fetched from the legacy listing, converted to
    /// the v2 shape.
    async fn list_legacy_models(
        &self,
        category: ModelCategory,
    ) -> Result<Vec<ModelRecord>, ClientError>;

    /// One page of audit statistics.
    async fn category_audit(
        &self,
        category: ModelCategory,
        query: AuditQuery,
    ) -> Result<CategoryAuditResponse, ClientError>;

    async fn create_model(
        &self,
        category: ModelCategory,
        record: &ModelRecord,
        api_key: Option<&str>,
    ) -> Result<ModelRecord, ClientError>;

    async fn update_model(
        &self,
        category: ModelCategory,
        name: &str,
        record: &ModelRecord,
        api_key: Option<&str>,
    ) -> Result<ModelRecord, ClientError>;

    async fn delete_model(
        &self,
        category: ModelCategory,
        name: &str,
        api_key: Option<&str>,
    ) -> Result<(), ClientError>;

    /// The service's own OpenAPI document, untouched.
    async fn openapi_schema(&self) -> Result<serde_json::Value, ClientError>;

    /// Every audit page starting at `query.offset`, concatenated into one
    /// response.
    ///
    /// Offsets advance from the requested offset by the number of models each
    /// page returned; the server's echoed `offset` is not trusted. Paging stops
    /// at `total_count` or at the first empty page.
    async fn category_audit_all(
        &self,
        category: ModelCategory,
        query: AuditQuery,
    ) -> Result<CategoryAuditResponse, ClientError> {
        let mut combined = self.category_audit(category, query).await?;
        combined.offset = query.offset;
        let total = u64::from(combined.total_count);
        let mut offset = query.offset;
        let mut returned = combined.models.len() as u32;

        while returned > 0 {
            let next_offset = offset.saturating_add(returned);
            if next_offset <= offset || u64::from(next_offset) >= total {
                break;
            }
            debug!(%category, offset = next_offset, "fetching next audit page");
            let page = self
                .category_audit(category, query.at_offset(next_offset))
                .await?;
            returned = page.models.len() as u32;
            offset = next_offset;
            combined.models.extend(page.models);
        }
        combined.returned_count = combined.models.len() as u32;
        Ok(combined)
    }

    /// Fetch audit data for the console. Failures are logged and turned into
    /// `None` so callers fall back to degraded mode.
    async fn audit_or_degraded(
        &self,
        category: ModelCategory,
        query: AuditQuery,
    ) -> Option<CategoryAuditResponse> {
        match self.category_audit_all(category, query).await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(%category, error = %e, "audit statistics unavailable; using degraded mode");
                None
            }
        }
    }
}
