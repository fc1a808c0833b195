//! In-memory [`ReferenceApi`] for handler and snapshot tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use modelref_client::{AuditQuery, ClientError, ReferenceApi};
use modelref_types::{
    CategoryAuditResponse, CategoryAuditSummary, ModelAuditInfo, ModelCategory, ModelRecord,
    RecordKind,
};
use strum::IntoEnumIterator;
use tokio::sync::Notify;

/// Lets a test pause `list_models` until it says so.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct FakeApi {
    models: Mutex<HashMap<ModelCategory, Vec<ModelRecord>>>,
    audits: Mutex<HashMap<ModelCategory, CategoryAuditResponse>>,
    audit_queries: Mutex<Vec<AuditQuery>>,
    audit_fails: AtomicBool,
    models_fail: AtomicBool,
    categories_fail: AtomicBool,
    model_calls: AtomicUsize,
    gate: Mutex<Option<Arc<Gate>>>,
    configured_key: Option<String>,
    last_api_key: Mutex<Option<String>>,
}

impl FakeApi {
    pub fn with_key(mut self, key: &str) -> Self {
        self.configured_key = Some(key.to_owned());
        self
    }

    pub fn with_models(self, category: ModelCategory, names: &[&str]) -> Self {
        let records = names
            .iter()
            .map(|n| ModelRecord::new(*n, RecordKind::empty_for(category)))
            .collect();
        self.with_records(category, records)
    }

    pub fn with_records(self, category: ModelCategory, records: Vec<ModelRecord>) -> Self {
        self.models
            .lock()
            .unwrap()
            .entry(category)
            .or_default()
            .extend(records);
        self
    }

    pub fn with_audit(self, category: ModelCategory, models: Vec<ModelAuditInfo>) -> Self {
        let response = CategoryAuditResponse {
            category,
            category_total_month_usage: models.iter().map(|m| m.usage_month).sum(),
            total_count: models.len() as u32,
            returned_count: models.len() as u32,
            offset: 0,
            models,
            summary: CategoryAuditSummary::default(),
        };
        self.audits.lock().unwrap().insert(category, response);
        self
    }

    pub fn fail_audit(&self) {
        self.audit_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_models(&self) {
        self.models_fail.store(true, Ordering::SeqCst);
    }

    pub fn fail_categories(&self) {
        self.categories_fail.store(true, Ordering::SeqCst);
    }

    /// Pause the next `list_models` call.
    pub fn hold_models(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn model_calls(&self) -> usize {
        self.model_calls.load(Ordering::SeqCst)
    }

    pub fn last_api_key(&self) -> Option<String> {
        self.last_api_key.lock().unwrap().clone()
    }

    pub fn audit_queries(&self) -> Vec<AuditQuery> {
        self.audit_queries.lock().unwrap().clone()
    }

    pub fn names(&self, category: ModelCategory) -> Vec<String> {
        self.models
            .lock()
            .unwrap()
            .get(&category)
            .map(|records| records.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    fn authorize(&self, api_key: Option<&str>) -> Result<(), ClientError> {
        let key = api_key
            .map(str::to_owned)
            .or_else(|| self.configured_key.clone())
            .ok_or(ClientError::MissingApiKey)?;
        *self.last_api_key.lock().unwrap() = Some(key);
        Ok(())
    }
}

pub fn audit_info(name: &str, category: ModelCategory, usage_month: u64, workers: u32) -> ModelAuditInfo {
    let mut info: ModelAuditInfo = serde_json::from_value(serde_json::json!({
        "name": name,
        "category": category,
    }))
    .unwrap();
    info.usage_month = usage_month;
    info.usage_total = usage_month;
    info.worker_count = workers;
    info.deletion_risk_flags.zero_usage_month = usage_month == 0;
    info.deletion_risk_flags.no_active_workers = workers == 0;
    info.is_critical = info.deletion_risk_flags.is_critical();
    info
}

#[async_trait]
impl ReferenceApi for FakeApi {
    async fn list_categories(&self) -> Result<Vec<String>, ClientError> {
        if self.categories_fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 503,
                body: "reference service down".into(),
            });
        }
        Ok(ModelCategory::iter().map(|c| c.to_string()).collect())
    }

    async fn list_models(&self, category: ModelCategory) -> Result<Vec<ModelRecord>, ClientError> {
        self.model_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.models_fail.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 500,
                body: "models unavailable".into(),
            });
        }
        let mut records = self
            .models
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .unwrap_or_default();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn list_legacy_models(
        &self,
        category: ModelCategory,
    ) -> Result<Vec<ModelRecord>, ClientError> {
        self.list_models(category).await
    }

    async fn category_audit(
        &self,
        category: ModelCategory,
        query: AuditQuery,
    ) -> Result<CategoryAuditResponse, ClientError> {
        self.audit_queries.lock().unwrap().push(query);
        if self.audit_fails.load(Ordering::SeqCst) {
            return Err(ClientError::Status {
                status: 503,
                body: "statistics unavailable".into(),
            });
        }
        self.audits
            .lock()
            .unwrap()
            .get(&category)
            .cloned()
            .ok_or(ClientError::Status {
                status: 404,
                body: "no statistics".into(),
            })
    }

    async fn create_model(
        &self,
        category: ModelCategory,
        record: &ModelRecord,
        api_key: Option<&str>,
    ) -> Result<ModelRecord, ClientError> {
        record.check()?;
        self.authorize(api_key)?;
        let mut models = self.models.lock().unwrap();
        let records = models.entry(category).or_default();
        if records.iter().any(|r| r.name == record.name) {
            return Err(ClientError::Status {
                status: 409,
                body: format!("{} already exists", record.name),
            });
        }
        records.push(record.clone());
        Ok(record.clone())
    }

    async fn update_model(
        &self,
        category: ModelCategory,
        name: &str,
        record: &ModelRecord,
        api_key: Option<&str>,
    ) -> Result<ModelRecord, ClientError> {
        record.check()?;
        self.authorize(api_key)?;
        let mut models = self.models.lock().unwrap();
        let existing = models
            .entry(category)
            .or_default()
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or(ClientError::Status {
                status: 404,
                body: format!("{name} not found"),
            })?;
        *existing = record.clone();
        Ok(record.clone())
    }

    async fn delete_model(
        &self,
        category: ModelCategory,
        name: &str,
        api_key: Option<&str>,
    ) -> Result<(), ClientError> {
        self.authorize(api_key)?;
        let mut models = self.models.lock().unwrap();
        let records = models.entry(category).or_default();
        let before = records.len();
        records.retain(|r| r.name != name);
        if records.len() == before {
            return Err(ClientError::Status {
                status: 404,
                body: format!("{name} not found"),
            });
        }
        Ok(())
    }

    async fn openapi_schema(&self) -> Result<serde_json::Value, ClientError> {
        Ok(serde_json::json!({ "openapi": "3.1.0", "info": { "title": "reference" } }))
    }
}
