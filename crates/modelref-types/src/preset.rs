//! Named audit filters understood by the statistics endpoint.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A preset narrows the audit listing on the server side.
///
/// The snake_case string form is the `preset` query value; [`AuditPreset::All`]
/// sends no preset at all.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
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
pub enum AuditPreset {
    #[default]
    All,
    DeletionCandidates,
    ZeroUsage,
    NoWorkers,
    MissingData,
    HostIssues,
    Critical,
    LowUsage,
}

impl AuditPreset {
    /// Value of the `preset` query parameter, if any.
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            AuditPreset::All => None,
            AuditPreset::DeletionCandidates => Some("deletion_candidates"),
            AuditPreset::ZeroUsage => Some("zero_usage"),
            AuditPreset::NoWorkers => Some("no_workers"),
            AuditPreset::MissingData => Some("missing_data"),
            AuditPreset::HostIssues => Some("host_issues"),
            AuditPreset::Critical => Some("critical"),
            AuditPreset::LowUsage => Some("low_usage"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AuditPreset::All => "All Models",
            AuditPreset::DeletionCandidates => "Deletion Candidates",
            AuditPreset::ZeroUsage => "Zero Usage",
            AuditPreset::NoWorkers => "No Workers",
            AuditPreset::MissingData => "Missing Data",
            AuditPreset::HostIssues => "Host Issues",
            AuditPreset::Critical => "Critical",
            AuditPreset::LowUsage => "Low Usage",
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn all_sends_no_query_value() {
        assert_eq!(AuditPreset::All.query_value(), None);
        assert_eq!(AuditPreset::default(), AuditPreset::All);
    }

    #[test]
    fn query_value_matches_string_form() {
        for preset in AuditPreset::iter().filter(|p| *p != AuditPreset::All) {
            assert_eq!(preset.query_value(), Some(preset.as_ref()));
        }
    }

    #[test]
    fn labels_are_distinct() {
        let mut labels: Vec<_> = AuditPreset::iter().map(AuditPreset::label).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), AuditPreset::iter().count());
    }
}
