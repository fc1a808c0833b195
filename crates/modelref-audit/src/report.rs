//! The full pipeline: aggregate, filter, then sort or rank.

use modelref_types::{
    AuditPreset, CategoryAuditResponse, CategoryAuditSummary, ModelCategory, ModelRecord,
};
use serde::Serialize;
use tracing::debug;

use crate::filter::{available_tags, AvailableTags, ClientFilter};
use crate::group::CatalogEntry;
use crate::metrics::{aggregate, ModelWithAuditMetrics};
use crate::sort::{rank_deletion_candidates, SortState};

/// What one audit view is computed from.
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub category: ModelCategory,
    pub preset: AuditPreset,
    pub grouped: bool,
    pub models: &'a [ModelRecord],
    pub audit: Option<&'a CategoryAuditResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub category: ModelCategory,
    pub preset: AuditPreset,
    pub preset_label: &'static str,
    /// No audit statistics were available; rows come from the records alone.
    pub degraded: bool,
    pub category_total_usage: u64,
    pub summary: Option<CategoryAuditSummary>,
    /// Rows before client-side filtering.
    pub total_rows: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub available_tags: AvailableTags,
    pub rows: Vec<ModelWithAuditMetrics>,
}

impl AuditReport {
    pub fn to_csv(&self) -> String {
        crate::export::to_csv(&self.rows)
    }
}

/// Build the rows of one audit view.
///
/// With a preset other than [`AuditPreset::All`], only models the server
/// returned statistics for are shown. The deletion-candidates preset ranks its
/// rows unless a column sort is active.
pub fn build_report(input: &ReportInput<'_>, filter: &ClientFilter, sort: SortState) -> AuditReport {
    let category_total = input
        .audit
        .map(|a| a.category_total_month_usage)
        .unwrap_or_default();

    let models: Vec<ModelRecord> = match (input.preset, input.audit) {
        (AuditPreset::All, _) | (_, None) => input.models.to_vec(),
        (_, Some(audit)) => input
            .models
            .iter()
            .filter(|m| in_audit(audit, m, input.grouped))
            .cloned()
            .collect(),
    };

    let entries = CatalogEntry::from_records(input.category, models, input.grouped);
    let all_rows = aggregate(&entries, input.audit, category_total);
    let total_rows = all_rows.len();
    let tags = available_tags(&all_rows);

    let mut rows = filter.apply(all_rows);
    if input.preset == AuditPreset::DeletionCandidates && sort.is_unsorted() {
        rank_deletion_candidates(&mut rows);
    } else {
        sort.apply(&mut rows);
    }
    debug!(
        category = %input.category,
        preset = %input.preset,
        total = total_rows,
        visible = rows.len(),
        degraded = input.audit.is_none(),
        "built audit report"
    );

    AuditReport {
        category: input.category,
        preset: input.preset,
        preset_label: input.preset.label(),
        degraded: input.audit.is_none(),
        category_total_usage: category_total,
        summary: input.audit.map(|a| a.summary.clone()),
        total_rows,
        critical_count: rows.iter().filter(|r| r.is_critical).count(),
        warning_count: rows.iter().filter(|r| r.has_warning).count(),
        available_tags: tags,
        rows,
    }
}

/// Whether the server's (preset-filtered) audit listing covers `record`.
/// Grouped listings may name the group instead of the variation.
fn in_audit(audit: &CategoryAuditResponse, record: &ModelRecord, grouped: bool) -> bool {
    if audit.find(&record.name).is_some() {
        return true;
    }
    grouped && audit.find(&crate::group::group_key(record)).is_some()
}
