//! Audit records returned by the statistics endpoint.
//!
//! These are produced server side and treated as a read-only snapshot.

use serde::{Deserialize, Serialize};

use crate::category::ModelCategory;

macro_rules! risk_flags {
    ($( $(#[$meta:meta])* $field:ident ),+ $(,)?) => {
        /// Booleans describing why a model might be a deletion candidate.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct DeletionRiskFlags {
            $(
                $(#[$meta])*
                #[serde(default)]
                pub $field: bool,
            )+
        }

        impl DeletionRiskFlags {
            /// Flag-wise OR.
            pub fn merge(&self, other: &Self) -> Self {
                Self {
                    $( $field: self.$field || other.$field, )+
                }
            }

            /// Names of the flags that are set, in declaration order.
            pub fn active_labels(&self) -> Vec<&'static str> {
                let mut out = Vec::new();
                $(
                    if self.$field {
                        out.push(stringify!($field));
                    }
                )+
                out
            }
        }
    };
}

risk_flags! {
    zero_usage_day,
    zero_usage_month,
    zero_usage_total,
    no_active_workers,
    has_multiple_hosts,
    has_non_preferred_host,
    has_unknown_host,
    no_download_urls,
    missing_description,
    missing_baseline,
    /// Usage below the server's low-usage threshold.
    low_usage,
}

impl DeletionRiskFlags {
    /// Nobody used it this month and nobody serves it.
    pub fn is_critical(&self) -> bool {
        self.zero_usage_month && self.no_active_workers
    }

    /// Something is off with where the files are hosted.
    pub fn has_warning(&self) -> bool {
        self.has_multiple_hosts
            || self.has_non_preferred_host
            || self.no_download_urls
            || self.has_unknown_host
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTrend {
    #[serde(default)]
    pub day_to_month_ratio: Option<f64>,
    #[serde(default)]
    pub month_to_total_ratio: Option<f64>,
}

/// Audit statistics of one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAuditInfo {
    pub name: String,
    pub category: ModelCategory,
    #[serde(default)]
    pub deletion_risk_flags: DeletionRiskFlags,
    #[serde(default)]
    pub risk_score: u32,
    #[serde(default)]
    pub is_critical: bool,
    #[serde(default)]
    pub has_warning: bool,
    #[serde(default)]
    pub worker_count: u32,
    #[serde(default)]
    pub usage_hour: u64,
    #[serde(default)]
    pub usage_day: u64,
    #[serde(default)]
    pub usage_month: u64,
    #[serde(default)]
    pub usage_total: u64,
    #[serde(default)]
    pub usage_percentage: f64,
    #[serde(default)]
    pub usage_trend: Option<UsageTrend>,
    #[serde(default)]
    pub cost_benefit_score: Option<f64>,
    #[serde(default)]
    pub size_gb: Option<f64>,
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default)]
    pub download_hosts: Vec<String>,
    #[serde(default)]
    pub download_count: u32,
    #[serde(default)]
    pub has_description: bool,
}

/// Category wide counters computed by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryAuditSummary {
    pub total_models: u32,
    pub models_at_risk: u32,
    pub models_critical: u32,
    pub models_with_warnings: u32,
    pub models_with_zero_day_usage: u32,
    pub models_with_zero_month_usage: u32,
    pub models_with_zero_total_usage: u32,
    pub models_with_no_active_workers: u32,
    pub models_with_multiple_hosts: u32,
    pub models_with_non_preferred_hosts: u32,
    pub models_with_low_usage: u32,
    pub average_risk_score: f64,
    pub category_total_month_usage: u64,
}

/// Envelope of one audit page for a category (and optional preset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAuditResponse {
    pub category: ModelCategory,
    #[serde(default)]
    pub category_total_month_usage: u64,
    #[serde(default)]
    pub total_count: u32,
    #[serde(default)]
    pub returned_count: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub models: Vec<ModelAuditInfo>,
    #[serde(default)]
    pub summary: CategoryAuditSummary,
}

impl CategoryAuditResponse {
    pub fn find(&self, name: &str) -> Option<&ModelAuditInfo> {
        self.models.iter().find(|m| m.name == name)
    }
}
