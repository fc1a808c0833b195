//! Request / response types of the console API.

use chrono::{DateTime, Utc};
use modelref_audit::{AuditReport, ClientFilter, SortColumn, SortDirection, SortState};
use modelref_types::{AuditPreset, ModelCategory};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::snapshot::{AuditSnapshot, SnapshotKey};

/// Query parameters of the audit endpoints.
///
/// `tag` and `param_tag` take comma-separated lists.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditParams {
    /// Server-side preset, e.g. `zero_usage` or `deletion_candidates`.
    #[param(value_type = Option<String>)]
    pub preset: Option<AuditPreset>,
    /// Fold text model variations into one row (default `true`).
    pub grouped: Option<bool>,
    pub search: Option<String>,
    pub tag: Option<String>,
    pub param_tag: Option<String>,
    /// Only rows with at least one active worker.
    pub active_only: Option<bool>,
    /// Column to sort by, e.g. `usage_month`.
    #[param(value_type = Option<String>)]
    pub sort: Option<SortColumn>,
    /// `asc` (default) or `desc`.
    #[param(value_type = Option<String>)]
    pub direction: Option<SortDirection>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl AuditParams {
    pub fn key(&self, category: ModelCategory) -> SnapshotKey {
        SnapshotKey::new(
            category,
            self.preset.unwrap_or_default(),
            self.grouped.unwrap_or(true),
        )
    }

    pub fn filter(&self) -> ClientFilter {
        ClientFilter {
            search: self.search.clone(),
            tags: split_list(self.tag.as_deref()),
            parameter_tags: split_list(self.param_tag.as_deref()),
            active_workers_only: self.active_only.unwrap_or(false),
        }
    }

    pub fn sort(&self) -> SortState {
        match self.sort {
            Some(column) => SortState::by(column, self.direction.unwrap_or(SortDirection::Asc)),
            None => SortState::default(),
        }
    }
}

/// Query parameters of the model listing.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ModelListParams {
    /// Read the legacy (v1) listing and convert it.
    pub legacy: Option<bool>,
}

/// An audit report plus the snapshot it was computed from.
#[derive(Debug, Serialize)]
pub struct AuditView {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: AuditReport,
}

impl AuditView {
    pub fn new(snapshot: &AuditSnapshot, report: AuditReport) -> Self {
        Self {
            generation: snapshot.generation,
            fetched_at: snapshot.fetched_at,
            report,
        }
    }
}

/// Response body of `POST .../audit/refresh`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub category: String,
    pub preset: String,
    pub grouped: bool,
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    /// Audit statistics were unavailable; the view shows record data only.
    pub degraded: bool,
    pub models: usize,
}

impl From<&AuditSnapshot> for RefreshResponse {
    fn from(snapshot: &AuditSnapshot) -> Self {
        Self {
            category: snapshot.key.category.to_string(),
            preset: snapshot.key.preset.to_string(),
            grouped: snapshot.key.grouped,
            generation: snapshot.generation,
            fetched_at: snapshot.fetched_at,
            degraded: snapshot.is_degraded(),
            models: snapshot.models.len(),
        }
    }
}
