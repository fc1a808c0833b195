//! Client-side filters applied on top of the server-filtered audit rows.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::metrics::ModelWithAuditMetrics;

static PARAMETER_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.?[0-9]*[bB]$").expect("valid parameter tag regex"));

/// Whether `tag` is a parameter-count shorthand like `7B` or `1.5b`.
pub fn is_parameter_tag(tag: &str) -> bool {
    PARAMETER_TAG_RE.is_match(tag)
}

fn parameter_count(tag: &str) -> f64 {
    tag[..tag.len() - 1].parse().unwrap_or(f64::MAX)
}

/// Filters that narrow the visible rows. The default filter keeps everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientFilter {
    /// Case-insensitive substring searched in names, descriptions, baselines,
    /// tags and group details.
    pub search: Option<String>,
    /// Semantic tags; a row must carry at least one of them.
    pub tags: Vec<String>,
    /// Parameter-count tags; a row must carry at least one of them.
    pub parameter_tags: Vec<String>,
    /// Drop rows without a known, positive worker count.
    pub active_workers_only: bool,
}

impl ClientFilter {
    pub fn is_empty(&self) -> bool {
        self.search().is_none()
            && self.tags.is_empty()
            && self.parameter_tags.is_empty()
            && !self.active_workers_only
    }

    fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, row: &ModelWithAuditMetrics) -> bool {
        if self.active_workers_only && !row.has_active_workers() {
            return false;
        }
        if !has_any_tag(row, &self.tags) || !has_any_tag(row, &self.parameter_tags) {
            return false;
        }
        match self.search() {
            Some(needle) => matches_search(row, &needle),
            None => true,
        }
    }

    /// Keep matching rows, preserving their order.
    pub fn apply(&self, rows: Vec<ModelWithAuditMetrics>) -> Vec<ModelWithAuditMetrics> {
        if self.is_empty() {
            return rows;
        }
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

fn has_any_tag(row: &ModelWithAuditMetrics, selected: &[String]) -> bool {
    selected.is_empty()
        || selected
            .iter()
            .any(|s| row.tags.iter().any(|t| t.eq_ignore_ascii_case(s)))
}

fn matches_search(row: &ModelWithAuditMetrics, needle: &str) -> bool {
    let hit = |value: &str| value.to_lowercase().contains(needle);

    if hit(&row.name)
        || row.description.as_deref().is_some_and(hit)
        || row.baseline.as_deref().is_some_and(hit)
        || row.tags.iter().any(|t| hit(t))
    {
        return true;
    }
    row.group.as_ref().is_some_and(|g| {
        g.backends.iter().any(|b| hit(b))
            || g.variations.iter().any(|v| hit(v))
            || g.author.as_deref().is_some_and(hit)
    })
}

/// Tags present in a row set, split for the two tag pickers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableTags {
    /// Alphabetical, case-insensitive.
    pub tags: Vec<String>,
    /// Ascending by parameter count.
    pub parameter_tags: Vec<String>,
}

pub fn available_tags(rows: &[ModelWithAuditMetrics]) -> AvailableTags {
    let mut out = AvailableTags::default();
    for tag in rows.iter().flat_map(|r| r.tags.iter()) {
        let bucket = if is_parameter_tag(tag) {
            &mut out.parameter_tags
        } else {
            &mut out.tags
        };
        if !bucket.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            bucket.push(tag.clone());
        }
    }
    out.tags.sort_by_key(|t| t.to_lowercase());
    out.parameter_tags.sort_by(|a, b| {
        parameter_count(a)
            .total_cmp(&parameter_count(b))
            .then_with(|| a.cmp(b))
    });
    out
}

#[cfg(test)]
mod tests {
    use modelref_types::UsageTrend;

    use super::*;
    use crate::metrics::GroupInfo;

    fn row(name: &str, tags: &[&str], workers: Option<u32>) -> ModelWithAuditMetrics {
        ModelWithAuditMetrics {
            name: name.into(),
            description: None,
            baseline: None,
            tags: tags.iter().map(|t| (*t).into()).collect(),
            nsfw: None,
            size_gb: None,
            file_hosts: Vec::new(),
            worker_count: workers,
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

    #[test]
    fn parameter_tags() {
        for tag in ["7B", "13b", "1.5B", "70B"] {
            assert!(is_parameter_tag(tag), "{tag}");
        }
        for tag in ["B", "7", "roleplay", "7B-chat", ".5B", "7 B"] {
            assert!(!is_parameter_tag(tag), "{tag}");
        }
    }

    #[test]
    fn parameter_tags_need_ascii_digits() {
        for tag in ["\u{0667}B", "\u{0967}\u{0969}b", "\u{FF17}B"] {
            assert!(!is_parameter_tag(tag), "{tag}");
        }
    }

    #[test]
    fn default_filter_keeps_everything() {
        let rows = vec![row("a", &[], None), row("b", &["x"], Some(0))];
        assert_eq!(ClientFilter::default().apply(rows.clone()), rows);
    }

    #[test]
    fn search_covers_description_baseline_and_tags() {
        let mut a = row("Alpha", &["anime"], None);
        a.description = Some("Painterly styles".into());
        let mut b = row("Beta", &[], None);
        b.baseline = Some("stable_diffusion_xl".into());
        let rows = vec![a, b, row("Gamma", &[], None)];

        let search = |s: &str| ClientFilter {
            search: Some(s.into()),
            ..Default::default()
        };
        let names = |f: ClientFilter| {
            f.apply(rows.clone())
                .into_iter()
                .map(|r| r.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(search("PAINTERLY")), vec!["Alpha"]);
        assert_eq!(names(search("xl")), vec!["Beta"]);
        assert_eq!(names(search("anime")), vec!["Alpha"]);
        assert_eq!(names(search("  ")).len(), 3);
    }

    #[test]
    fn search_covers_group_details() {
        let mut grouped = row("Hermes-2-Pro", &[], None);
        grouped.group = Some(GroupInfo {
            author: Some("NousResearch".into()),
            backends: vec!["aphrodite".into()],
            variations: vec!["aphrodite/NousResearch/Hermes-2-Pro-GGUF".into()],
        });
        let rows = vec![grouped, row("Other", &[], None)];

        for needle in ["nousresearch", "APHRODITE", "gguf"] {
            let filter = ClientFilter {
                search: Some(needle.into()),
                ..Default::default()
            };
            let kept = filter.apply(rows.clone());
            assert_eq!(kept.len(), 1, "{needle}");
            assert_eq!(kept[0].name, "Hermes-2-Pro");
        }
    }

    #[test]
    fn tag_selections_or_within_and_across() {
        let rows = vec![
            row("a", &["roleplay", "7B"], None),
            row("b", &["instruct", "13B"], None),
            row("c", &["roleplay", "13B"], None),
        ];
        let filter = ClientFilter {
            tags: vec!["Roleplay".into(), "instruct".into()],
            parameter_tags: vec!["13b".into()],
            ..Default::default()
        };
        let names: Vec<_> = filter.apply(rows).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn active_only_drops_unknown_and_idle() {
        let rows = vec![
            row("unknown", &[], None),
            row("idle", &[], Some(0)),
            row("busy", &[], Some(2)),
        ];
        let filter = ClientFilter {
            active_workers_only: true,
            ..Default::default()
        };
        let kept = filter.apply(rows);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "busy");
    }

    #[test]
    fn available_tags_split_and_sorted() {
        let rows = vec![
            row("a", &["Roleplay", "13B", "7B"], None),
            row("b", &["anime", "1.5B", "roleplay", "70B"], None),
        ];
        let tags = available_tags(&rows);
        assert_eq!(tags.tags, vec!["anime", "Roleplay"]);
        assert_eq!(tags.parameter_tags, vec!["1.5B", "7B", "13B", "70B"]);
    }
}
