//! Folding text model variations into catalog entries.
//!
//! Text models are published once per inference backend and quantization,
//! e.g. `koboldcpp/NousResearch/Hermes-2-Pro` and `aphrodite/NousResearch/Hermes-2-Pro`.
//! The console shows such variations as one row.

use std::collections::HashMap;

use modelref_types::{ModelCategory, ModelRecord};
use serde::Serialize;

/// Backends that prefix text model names.
pub const KNOWN_BACKENDS: &[&str] = &["koboldcpp", "aphrodite"];

/// Components of a text model name `[backend/][author/]model`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextModelName<'a> {
    pub backend: Option<&'a str>,
    pub author: Option<&'a str>,
    pub model: &'a str,
}

pub fn parse_text_model_name(name: &str) -> TextModelName<'_> {
    let (backend, rest) = match name.split_once('/') {
        Some((prefix, rest)) if KNOWN_BACKENDS.contains(&prefix.to_ascii_lowercase().as_str()) => {
            (Some(prefix), rest)
        }
        _ => (None, name),
    };
    let (author, model) = match rest.split_once('/') {
        Some((author, model)) if !author.is_empty() => (Some(author), model),
        _ => (None, rest),
    };
    TextModelName {
        backend,
        author,
        model,
    }
}

/// Key under which variations are grouped: the explicit group name when the
/// record declares one, the bare model name otherwise.
pub fn group_key(record: &ModelRecord) -> String {
    record
        .text_fields()
        .and_then(|t| t.text_model_group.as_deref())
        .filter(|g| !g.trim().is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| parse_text_model_name(&record.name).model.to_owned())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextVariation {
    pub name: String,
    pub backend: Option<String>,
    #[serde(skip)]
    pub record: ModelRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTextModel {
    pub name: String,
    pub author: Option<String>,
    pub variations: Vec<TextVariation>,
}

impl GroupedTextModel {
    pub fn backends(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for backend in self.variations.iter().filter_map(|v| v.backend.as_ref()) {
            if !out.contains(backend) {
                out.push(backend.clone());
            }
        }
        out
    }

    pub fn variation_names(&self) -> Vec<String> {
        self.variations.iter().map(|v| v.name.clone()).collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &ModelRecord> {
        self.variations.iter().map(|v| &v.record)
    }
}

/// Group text records, keeping the order in which groups are first seen.
pub fn group_text_models(records: Vec<ModelRecord>) -> Vec<GroupedTextModel> {
    let mut groups: Vec<GroupedTextModel> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = group_key(&record);
        let parsed = parse_text_model_name(&record.name);
        let backend = parsed.backend.map(str::to_owned);
        let author = parsed.author.map(str::to_owned);
        let variation = TextVariation {
            name: record.name.clone(),
            backend,
            record,
        };

        match index.get(&key) {
            Some(&i) => {
                let group = &mut groups[i];
                if group.author.is_none() {
                    group.author = author;
                }
                group.variations.push(variation);
            }
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(GroupedTextModel {
                    name: key,
                    author,
                    variations: vec![variation],
                });
            }
        }
    }
    groups
}

/// One row source of the audit table.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    Single(ModelRecord),
    Grouped(GroupedTextModel),
}

impl CatalogEntry {
    pub fn name(&self) -> &str {
        match self {
            CatalogEntry::Single(record) => &record.name,
            CatalogEntry::Grouped(group) => &group.name,
        }
    }

    /// Build entries for a category listing, grouping text variations when
    /// asked to and the category supports it.
    pub fn from_records(
        category: ModelCategory,
        records: Vec<ModelRecord>,
        group: bool,
    ) -> Vec<CatalogEntry> {
        if group && category.supports_grouping() {
            group_text_models(records)
                .into_iter()
                .map(CatalogEntry::Grouped)
                .collect()
        } else {
            records.into_iter().map(CatalogEntry::Single).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use modelref_types::{RecordKind, TextGenerationFields};

    use super::*;

    fn text(name: &str, group: Option<&str>) -> ModelRecord {
        ModelRecord::new(
            name,
            RecordKind::TextGeneration(TextGenerationFields {
                baseline: "llama3".into(),
                text_model_group: group.map(str::to_owned),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn parses_backend_author_and_model() {
        assert_eq!(
            parse_text_model_name("koboldcpp/NousResearch/Hermes-2-Pro"),
            TextModelName {
                backend: Some("koboldcpp"),
                author: Some("NousResearch"),
                model: "Hermes-2-Pro",
            }
        );
        assert_eq!(
            parse_text_model_name("NousResearch/Hermes-2-Pro"),
            TextModelName {
                backend: None,
                author: Some("NousResearch"),
                model: "Hermes-2-Pro",
            }
        );
        assert_eq!(
            parse_text_model_name("Hermes-2-Pro"),
            TextModelName {
                backend: None,
                author: None,
                model: "Hermes-2-Pro",
            }
        );
    }

    #[test]
    fn groups_variations_by_model_name() {
        let groups = group_text_models(vec![
            text("koboldcpp/Sao10K/Fimbulvetr-11B-v2", None),
            text("Gryphe/MythoMax-L2-13b", None),
            text("aphrodite/Sao10K/Fimbulvetr-11B-v2", None),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Fimbulvetr-11B-v2");
        assert_eq!(groups[0].author.as_deref(), Some("Sao10K"));
        assert_eq!(groups[0].backends(), vec!["koboldcpp", "aphrodite"]);
        assert_eq!(groups[1].name, "MythoMax-L2-13b");
        assert!(groups[1].backends().is_empty());
    }

    #[test]
    fn explicit_group_wins() {
        let groups = group_text_models(vec![
            text("koboldcpp/Llama-3-8B-Q4", Some("Llama-3-8B")),
            text("koboldcpp/Llama-3-8B-Q8", Some("Llama-3-8B")),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].variation_names(),
            vec!["koboldcpp/Llama-3-8B-Q4", "koboldcpp/Llama-3-8B-Q8"]
        );
    }

    #[test]
    fn entries_only_group_text_generation() {
        let records = vec![text("koboldcpp/A", None), text("aphrodite/A", None)];
        let grouped = CatalogEntry::from_records(ModelCategory::TextGeneration, records.clone(), true);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].name(), "A");

        let flat = CatalogEntry::from_records(ModelCategory::TextGeneration, records.clone(), false);
        assert_eq!(flat.len(), 2);

        let other = CatalogEntry::from_records(ModelCategory::Lora, records, true);
        assert!(other.iter().all(|e| matches!(e, CatalogEntry::Single(_))));
    }
}
