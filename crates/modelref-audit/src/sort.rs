//! Three-state column sort and deletion-candidate ranking.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::metrics::{ModelWithAuditMetrics, UsageFigures};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortColumn {
    Name,
    Baseline,
    Workers,
    UsageHour,
    UsageDay,
    UsageMonth,
    UsageTotal,
    UsagePercentage,
    CostBenefit,
    RiskScore,
    SizeGb,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort key of one cell. `Missing` always sorts after known values.
#[derive(Debug, Clone, PartialEq)]
enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl SortKey<'_> {
    fn compare_known(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl SortColumn {
    fn key<'a>(&self, row: &'a ModelWithAuditMetrics) -> SortKey<'a> {
        let number = |v: Option<f64>| v.map_or(SortKey::Missing, SortKey::Number);
        let usage = |f: fn(&UsageFigures) -> u64| {
            number(row.usage.as_ref().map(|u| f(u) as f64))
        };
        match self {
            SortColumn::Name => SortKey::Text(&row.name),
            SortColumn::Baseline => row.baseline.as_deref().map_or(SortKey::Missing, SortKey::Text),
            SortColumn::Workers => number(row.worker_count.map(f64::from)),
            SortColumn::UsageHour => usage(|u| u.hour),
            SortColumn::UsageDay => usage(|u| u.day),
            SortColumn::UsageMonth => usage(|u| u.month),
            SortColumn::UsageTotal => usage(|u| u.total),
            SortColumn::UsagePercentage => {
                number(row.usage.is_some().then_some(row.usage_percentage))
            }
            SortColumn::CostBenefit => number(row.cost_benefit_score),
            SortColumn::RiskScore => number(row.flags.is_some().then_some(row.risk_score as f64)),
            SortColumn::SizeGb => number(row.size_gb),
        }
    }
}

/// Current sort of the audit table; `None` column means input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn by(column: SortColumn, direction: SortDirection) -> Self {
        Self {
            column: Some(column),
            direction: Some(direction),
        }
    }

    pub fn is_unsorted(&self) -> bool {
        self.column.is_none() || self.direction.is_none()
    }

    /// Header click: the same column cycles asc, desc, unsorted; another
    /// column starts over at asc.
    pub fn toggle(self, column: SortColumn) -> Self {
        match (self.column, self.direction) {
            (Some(current), Some(SortDirection::Asc)) if current == column => {
                Self::by(column, SortDirection::Desc)
            }
            (Some(current), Some(SortDirection::Desc)) if current == column => Self::default(),
            _ => Self::by(column, SortDirection::Asc),
        }
    }

    /// Stable sort of `rows`. Missing values stay at the end in both
    /// directions.
    pub fn apply(&self, rows: &mut [ModelWithAuditMetrics]) {
        let (Some(column), Some(direction)) = (self.column, self.direction) else {
            return;
        };
        rows.sort_by(|a, b| {
            let (ka, kb) = (column.key(a), column.key(b));
            match (&ka, &kb) {
                (SortKey::Missing, SortKey::Missing) => Ordering::Equal,
                (SortKey::Missing, _) => Ordering::Greater,
                (_, SortKey::Missing) => Ordering::Less,
                _ => {
                    let ord = ka.compare_known(&kb);
                    match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            }
        });
    }
}

/// Order rows for the deletion-candidates view: critical first, then by
/// risk score (highest first), monthly usage (lowest first, unknown last) and
/// name.
pub fn rank_deletion_candidates(rows: &mut [ModelWithAuditMetrics]) {
    rows.sort_by(|a, b| {
        b.is_critical
            .cmp(&a.is_critical)
            .then_with(|| b.risk_score.cmp(&a.risk_score))
            .then_with(|| match (a.usage_month(), b.usage_month()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.name.cmp(&b.name))
    });
}
