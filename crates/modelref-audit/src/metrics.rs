//! Turning catalog entries plus optional audit statistics into table rows.

use modelref_types::{
    CategoryAuditResponse, DeletionRiskFlags, ModelAuditInfo, ModelRecord, UsageTrend,
};
use serde::Serialize;
use tracing::debug;

use crate::group::{CatalogEntry, GroupedTextModel};
use crate::hosts::hosts_from_urls;
use crate::reduce::{any, fold, max, max_known, sum, union};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageFigures {
    pub hour: u64,
    pub day: u64,
    pub month: u64,
    pub total: u64,
}

/// Grouping details of a row built from several text variations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupInfo {
    pub author: Option<String>,
    pub backends: Vec<String>,
    pub variations: Vec<String>,
}

/// One display-ready row of the audit table.
///
/// `usage`, `worker_count` and `flags` are `None` when no audit statistics
/// matched the row (degraded mode).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelWithAuditMetrics {
    pub name: String,
    pub description: Option<String>,
    pub baseline: Option<String>,
    pub tags: Vec<String>,
    pub nsfw: Option<bool>,
    pub size_gb: Option<f64>,
    pub file_hosts: Vec<String>,
    pub worker_count: Option<u32>,
    pub usage: Option<UsageFigures>,
    pub usage_percentage: f64,
    pub usage_trend: UsageTrend,
    pub cost_benefit_score: Option<f64>,
    pub flags: Option<DeletionRiskFlags>,
    pub risk_score: u32,
    pub is_critical: bool,
    pub has_warning: bool,
    pub group: Option<GroupInfo>,
}

impl ModelWithAuditMetrics {
    pub fn is_degraded(&self) -> bool {
        self.usage.is_none()
    }

    pub fn usage_month(&self) -> Option<u64> {
        self.usage.map(|u| u.month)
    }

    pub fn has_active_workers(&self) -> bool {
        self.worker_count.is_some_and(|w| w > 0)
    }
}

/// Share of the category's monthly usage, in percent. `0` when the category
/// total is `0`.
pub fn usage_percentage(usage_month: u64, category_total: u64) -> f64 {
    if category_total > 0 {
        usage_month as f64 / category_total as f64 * 100.0
    } else {
        0.0
    }
}

/// `numerator / denominator`, or `None` when the denominator is `0`.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

pub fn usage_trend(usage: &UsageFigures) -> UsageTrend {
    UsageTrend {
        day_to_month_ratio: ratio(usage.day, usage.month),
        month_to_total_ratio: ratio(usage.month, usage.total),
    }
}

/// Monthly requests served per GiB on disk. `None` when the size is unknown
/// or not positive.
pub fn cost_benefit_score(usage_month: u64, size_gb: Option<f64>) -> Option<f64> {
    size_gb
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(|s| usage_month as f64 / s)
}

fn figures(info: &ModelAuditInfo) -> UsageFigures {
    UsageFigures {
        hour: info.usage_hour,
        day: info.usage_day,
        month: info.usage_month,
        total: info.usage_total,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).map(str::to_owned)
}

/// Statistics of several variations folded into one.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedAudit {
    pub usage: UsageFigures,
    pub worker_count: u32,
    pub flags: DeletionRiskFlags,
    pub risk_score: u32,
    pub is_critical: bool,
    pub has_warning: bool,
    pub download_hosts: Vec<String>,
    pub size_gb: Option<f64>,
}

fn merge_flags(a: DeletionRiskFlags, b: DeletionRiskFlags) -> DeletionRiskFlags {
    a.merge(&b)
}

/// Fold per-variation audit records: counters are summed, flags and
/// critical/warning are OR-ed, the risk score is the maximum and hosts are
/// unioned. `None` for an empty list.
pub fn aggregate_variations(infos: &[&ModelAuditInfo]) -> Option<AggregatedAudit> {
    let flags = fold(infos, |i| i.deletion_risk_flags, merge_flags)?;
    Some(AggregatedAudit {
        usage: UsageFigures {
            hour: fold(infos, |i| i.usage_hour, sum::<u64>)?,
            day: fold(infos, |i| i.usage_day, sum::<u64>)?,
            month: fold(infos, |i| i.usage_month, sum::<u64>)?,
            total: fold(infos, |i| i.usage_total, sum::<u64>)?,
        },
        worker_count: fold(infos, |i| i.worker_count, sum::<u32>)?,
        flags,
        risk_score: fold(infos, |i| i.risk_score, max::<u32>)?,
        is_critical: fold(infos, |i| i.is_critical, any)?,
        has_warning: fold(infos, |i| i.has_warning, any)?,
        download_hosts: fold(infos, |i| i.download_hosts.clone(), union)?,
        size_gb: fold(infos, |i| i.size_gb, max_known)?,
    })
}

/// Build one row per entry.
///
/// Rows whose name has no match in `audit` (or all rows, when `audit` is
/// `None`) are derived from the reference record alone.
pub fn aggregate(
    entries: &[CatalogEntry],
    audit: Option<&CategoryAuditResponse>,
    category_total: u64,
) -> Vec<ModelWithAuditMetrics> {
    entries
        .iter()
        .map(|entry| match entry {
            CatalogEntry::Single(record) => {
                single_row(record, audit.and_then(|a| a.find(&record.name)), category_total)
            }
            CatalogEntry::Grouped(group) => grouped_row(group, audit, category_total),
        })
        .collect()
}

fn single_row(
    record: &ModelRecord,
    info: Option<&ModelAuditInfo>,
    category_total: u64,
) -> ModelWithAuditMetrics {
    let Some(info) = info else {
        return degraded_row(record);
    };

    let usage = figures(info);
    let size_gb = record.size_gb().or(info.size_gb);
    let file_hosts = if info.download_hosts.is_empty() {
        hosts_from_urls(record.download_urls())
    } else {
        info.download_hosts.clone()
    };

    ModelWithAuditMetrics {
        name: record.name.clone(),
        description: non_empty(record.description.as_deref()),
        baseline: record
            .baseline()
            .map(str::to_owned)
            .or_else(|| non_empty(info.baseline.as_deref())),
        tags: record.tags.clone(),
        nsfw: record.nsfw(),
        size_gb,
        file_hosts,
        worker_count: Some(info.worker_count),
        usage: Some(usage),
        usage_percentage: usage_percentage(usage.month, category_total),
        usage_trend: info.usage_trend.unwrap_or_else(|| usage_trend(&usage)),
        cost_benefit_score: info
            .cost_benefit_score
            .or_else(|| cost_benefit_score(usage.month, size_gb)),
        flags: Some(info.deletion_risk_flags),
        risk_score: info.risk_score,
        is_critical: info.is_critical,
        has_warning: info.has_warning,
        group: None,
    }
}

/// Row for a record with no audit statistics. Flags are unknown and the row
/// is never marked critical or warning.
fn degraded_row(record: &ModelRecord) -> ModelWithAuditMetrics {
    ModelWithAuditMetrics {
        name: record.name.clone(),
        description: non_empty(record.description.as_deref()),
        baseline: record.baseline().map(str::to_owned),
        tags: record.tags.clone(),
        nsfw: record.nsfw(),
        size_gb: record.size_gb(),
        file_hosts: hosts_from_urls(record.download_urls()),
        worker_count: None,
        usage: None,
        usage_percentage: 0.0,
        usage_trend: UsageTrend::default(),
        cost_benefit_score: None,
        flags: None,
        risk_score: 0,
        is_critical: false,
        has_warning: false,
        group: None,
    }
}

fn grouped_row(
    group: &GroupedTextModel,
    audit: Option<&CategoryAuditResponse>,
    category_total: u64,
) -> ModelWithAuditMetrics {
    let records: Vec<&ModelRecord> = group.records().collect();
    let record_hosts = hosts_from_urls(records.iter().copied().flat_map(ModelRecord::download_urls));
    let description = records
        .iter()
        .find_map(|r| non_empty(r.description.as_deref()));
    let baseline = records.iter().find_map(|r| r.baseline().map(str::to_owned));
    let tags = fold(&records, |r| r.tags.clone(), union).unwrap_or_default();
    let nsfw = records
        .iter()
        .filter_map(|r| r.nsfw())
        .reduce(any);

    // Per-variation statistics; a grouped listing may instead carry one
    // entry under the group name.
    let infos: Vec<&ModelAuditInfo> = audit
        .map(|a| {
            let per_variation: Vec<_> = group
                .variations
                .iter()
                .filter_map(|v| a.find(&v.name))
                .collect();
            if per_variation.is_empty() {
                a.find(&group.name).into_iter().collect()
            } else {
                per_variation
            }
        })
        .unwrap_or_default();

    let group_info = GroupInfo {
        author: group.author.clone(),
        backends: group.backends(),
        variations: group.variation_names(),
    };

    let Some(aggregated) = aggregate_variations(&infos) else {
        debug!(group = %group.name, "no audit statistics for any variation");
        return ModelWithAuditMetrics {
            name: group.name.clone(),
            description,
            baseline,
            tags,
            nsfw,
            size_gb: None,
            file_hosts: record_hosts,
            worker_count: None,
            usage: None,
            usage_percentage: 0.0,
            usage_trend: UsageTrend::default(),
            cost_benefit_score: None,
            flags: None,
            risk_score: 0,
            is_critical: false,
            has_warning: false,
            group: Some(group_info),
        };
    };

    let file_hosts = if aggregated.download_hosts.is_empty() {
        record_hosts
    } else {
        aggregated.download_hosts
    };
    let usage = aggregated.usage;

    ModelWithAuditMetrics {
        name: group.name.clone(),
        description,
        baseline: baseline.or_else(|| infos.iter().find_map(|i| non_empty(i.baseline.as_deref()))),
        tags,
        nsfw,
        size_gb: aggregated.size_gb,
        file_hosts,
        worker_count: Some(aggregated.worker_count),
        usage: Some(usage),
        usage_percentage: usage_percentage(usage.month, category_total),
        usage_trend: usage_trend(&usage),
        cost_benefit_score: cost_benefit_score(usage.month, aggregated.size_gb),
        flags: Some(aggregated.flags),
        risk_score: aggregated.risk_score,
        is_critical: aggregated.is_critical,
        has_warning: aggregated.has_warning,
        group: Some(group_info),
    }
}

#[cfg(test)]
mod tests {
    use modelref_types::{
        CategoryAuditSummary, DownloadRecord, ImageGenerationFields, ModelCategory, RecordKind,
        TextGenerationFields,
    };

    use super::*;
    use crate::group::group_text_models;

    fn image(name: &str, urls: &[&str]) -> ModelRecord {
        let mut record = ModelRecord::new(
            name,
            RecordKind::ImageGeneration(ImageGenerationFields {
                baseline: "stable_diffusion_xl".into(),
                size_on_disk_bytes: Some(2 * 1024 * 1024 * 1024),
                ..Default::default()
            }),
        );
        record.description = Some(format!("{name} description"));
        record.config.download = urls
            .iter()
            .map(|u| DownloadRecord {
                file_name: "model.safetensors".into(),
                file_url: (*u).into(),
                sha256sum: None,
            })
            .collect();
        record
    }

    fn text(name: &str) -> ModelRecord {
        ModelRecord::new(
            name,
            RecordKind::TextGeneration(TextGenerationFields {
                baseline: "mistral".into(),
                ..Default::default()
            }),
        )
    }

    fn info(name: &str, category: ModelCategory) -> ModelAuditInfo {
        ModelAuditInfo {
            name: name.into(),
            category,
            deletion_risk_flags: DeletionRiskFlags::default(),
            risk_score: 0,
            is_critical: false,
            has_warning: false,
            worker_count: 0,
            usage_hour: 0,
            usage_day: 0,
            usage_month: 0,
            usage_total: 0,
            usage_percentage: 0.0,
            usage_trend: None,
            cost_benefit_score: None,
            size_gb: None,
            baseline: None,
            download_hosts: Vec::new(),
            download_count: 0,
            has_description: true,
        }
    }

    fn response(category: ModelCategory, total: u64, models: Vec<ModelAuditInfo>) -> CategoryAuditResponse {
        CategoryAuditResponse {
            category,
            category_total_month_usage: total,
            total_count: models.len() as u32,
            returned_count: models.len() as u32,
            offset: 0,
            models,
            summary: CategoryAuditSummary::default(),
        }
    }

    #[test]
    fn zero_category_total_gives_zero_percentage() {
        assert_eq!(usage_percentage(0, 0), 0.0);
        assert_eq!(usage_percentage(500, 0), 0.0);
        assert_eq!(usage_percentage(25, 100), 25.0);
    }

    #[test]
    fn ratios_are_none_for_zero_denominators() {
        let trend = usage_trend(&UsageFigures { hour: 0, day: 5, month: 0, total: 0 });
        assert_eq!(trend.day_to_month_ratio, None);
        assert_eq!(trend.month_to_total_ratio, None);

        let trend = usage_trend(&UsageFigures { hour: 1, day: 10, month: 100, total: 400 });
        assert_eq!(trend.day_to_month_ratio, Some(0.1));
        assert_eq!(trend.month_to_total_ratio, Some(0.25));
        assert!(trend.day_to_month_ratio.unwrap().is_finite());
    }

    #[test]
    fn cost_benefit_requires_positive_size() {
        assert_eq!(cost_benefit_score(100, None), None);
        assert_eq!(cost_benefit_score(100, Some(0.0)), None);
        assert_eq!(cost_benefit_score(100, Some(2.0)), Some(50.0));
    }

    #[test]
    fn single_row_uses_backend_statistics() {
        let record = image("Deliberate", &["https://huggingface.co/d.safetensors"]);
        let mut stats = info("Deliberate", ModelCategory::ImageGeneration);
        stats.worker_count = 3;
        stats.usage_day = 10;
        stats.usage_month = 200;
        stats.usage_total = 1000;
        stats.risk_score = 2;
        stats.deletion_risk_flags.low_usage = true;
        let audit = response(ModelCategory::ImageGeneration, 800, vec![stats]);

        let rows = aggregate(&[CatalogEntry::Single(record)], Some(&audit), 800);
        let row = &rows[0];
        assert!(!row.is_degraded());
        assert_eq!(row.worker_count, Some(3));
        assert_eq!(row.usage_percentage, 25.0);
        assert_eq!(row.usage_trend.day_to_month_ratio, Some(0.05));
        assert_eq!(row.usage_trend.month_to_total_ratio, Some(0.2));
        assert_eq!(row.cost_benefit_score, Some(100.0));
        assert_eq!(row.file_hosts, vec!["huggingface.co"]);
        assert!(row.flags.unwrap().low_usage);
        assert_eq!(row.risk_score, 2);
    }

    #[test]
    fn backend_trend_is_preferred_for_single_rows() {
        let record = image("A", &[]);
        let mut stats = info("A", ModelCategory::ImageGeneration);
        stats.usage_month = 10;
        stats.usage_trend = Some(UsageTrend {
            day_to_month_ratio: Some(0.5),
            month_to_total_ratio: None,
        });
        stats.cost_benefit_score = Some(7.0);
        let audit = response(ModelCategory::ImageGeneration, 10, vec![stats]);

        let row = &aggregate(&[CatalogEntry::Single(record)], Some(&audit), 10)[0];
        assert_eq!(row.usage_trend.day_to_month_ratio, Some(0.5));
        assert_eq!(row.cost_benefit_score, Some(7.0));
    }

    #[test]
    fn missing_audit_falls_back_to_record() {
        let record = image(
            "Anything",
            &[
                "https://civitai.com/api/download/models/1",
                "https://huggingface.co/a.safetensors",
            ],
        );
        let rows = aggregate(&[CatalogEntry::Single(record)], None, 0);
        let row = &rows[0];
        assert!(row.is_degraded());
        assert_eq!(row.flags, None);
        assert!(!row.is_critical);
        assert!(!row.has_warning);
        assert_eq!(row.worker_count, None);
        assert_eq!(row.usage_percentage, 0.0);
        assert_eq!(row.baseline.as_deref(), Some("stable_diffusion_xl"));
        assert_eq!(row.size_gb, Some(2.0));
        assert_eq!(row.file_hosts, vec!["civitai.com", "huggingface.co"]);
        assert_eq!(row.usage_trend, UsageTrend::default());
    }

    #[test]
    fn unmatched_name_is_degraded_even_with_audit() {
        let audit = response(ModelCategory::ImageGeneration, 100, vec![info("Other", ModelCategory::ImageGeneration)]);
        let rows = aggregate(&[CatalogEntry::Single(image("Mine", &[]))], Some(&audit), 100);
        assert!(rows[0].is_degraded());
    }

    #[test]
    fn grouped_row_sums_counters_and_ors_flags() {
        let groups = group_text_models(vec![
            text("koboldcpp/Undi95/Toppy-M-7B"),
            text("aphrodite/Undi95/Toppy-M-7B"),
        ]);

        let mut a = info("koboldcpp/Undi95/Toppy-M-7B", ModelCategory::TextGeneration);
        a.worker_count = 2;
        a.usage_day = 5;
        a.usage_month = 40;
        a.usage_total = 100;
        a.risk_score = 1;
        a.has_warning = true;
        a.deletion_risk_flags.has_multiple_hosts = true;
        a.download_hosts = vec!["huggingface.co".into()];

        let mut b = info("aphrodite/Undi95/Toppy-M-7B", ModelCategory::TextGeneration);
        b.worker_count = 1;
        b.usage_day = 5;
        b.usage_month = 60;
        b.usage_total = 300;
        b.risk_score = 4;
        b.deletion_risk_flags.low_usage = true;
        b.download_hosts = vec!["huggingface.co".into(), "example.org".into()];

        let audit = response(ModelCategory::TextGeneration, 200, vec![a, b]);
        let entries: Vec<_> = groups.into_iter().map(CatalogEntry::Grouped).collect();
        let row = &aggregate(&entries, Some(&audit), 200)[0];

        assert_eq!(row.name, "Toppy-M-7B");
        assert_eq!(row.worker_count, Some(3));
        assert_eq!(row.usage.unwrap().month, 100);
        assert_eq!(row.usage_percentage, 50.0);
        assert_eq!(row.usage_trend.day_to_month_ratio, Some(0.1));
        assert_eq!(row.usage_trend.month_to_total_ratio, Some(0.25));
        let flags = row.flags.unwrap();
        assert!(flags.has_multiple_hosts && flags.low_usage);
        assert_eq!(row.risk_score, 4);
        assert!(row.has_warning);
        assert!(!row.is_critical);
        assert_eq!(row.file_hosts, vec!["huggingface.co", "example.org"]);
        let group = row.group.as_ref().unwrap();
        assert_eq!(group.author.as_deref(), Some("Undi95"));
        assert_eq!(group.backends, vec!["koboldcpp", "aphrodite"]);
    }

    #[test]
    fn group_is_critical_if_any_variation_is() {
        let groups = group_text_models(vec![text("koboldcpp/X"), text("aphrodite/X")]);
        let mut a = info("koboldcpp/X", ModelCategory::TextGeneration);
        a.is_critical = true;
        let b = info("aphrodite/X", ModelCategory::TextGeneration);
        let audit = response(ModelCategory::TextGeneration, 0, vec![a, b]);
        let entries: Vec<_> = groups.into_iter().map(CatalogEntry::Grouped).collect();
        let row = &aggregate(&entries, Some(&audit), 0)[0];
        assert!(row.is_critical);
        assert_eq!(row.usage_percentage, 0.0);
        assert_eq!(row.usage_trend.month_to_total_ratio, None);
    }

    #[test]
    fn group_named_entry_is_used_when_variations_are_missing() {
        let groups = group_text_models(vec![text("koboldcpp/Z"), text("aphrodite/Z")]);
        let mut folded = info("Z", ModelCategory::TextGeneration);
        folded.worker_count = 4;
        folded.usage_month = 12;
        let audit = response(ModelCategory::TextGeneration, 24, vec![folded]);
        let entries: Vec<_> = groups.into_iter().map(CatalogEntry::Grouped).collect();
        let row = &aggregate(&entries, Some(&audit), 24)[0];
        assert_eq!(row.worker_count, Some(4));
        assert_eq!(row.usage_percentage, 50.0);
    }

    #[test]
    fn group_without_statistics_is_degraded() {
        let groups = group_text_models(vec![text("koboldcpp/Y")]);
        let entries: Vec<_> = groups.into_iter().map(CatalogEntry::Grouped).collect();
        let row = &aggregate(&entries, None, 0)[0];
        assert!(row.is_degraded());
        assert_eq!(row.flags, None);
        assert_eq!(row.baseline.as_deref(), Some("mistral"));
        assert!(row.group.is_some());
    }
}
