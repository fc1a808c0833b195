//! Records in the legacy (v1) listing shape.
//!
//! Legacy listings carry no `record_type`; the category comes from the URL
//! the listing was fetched from. Hashes live in a separate `config.files`
//! list keyed by file path.

use serde::{Deserialize, Serialize};

use crate::category::ModelCategory;
use crate::record::{
    ControlnetFields, DownloadRecord, ImageGenerationFields, ModelRecord, RecordConfig,
    RecordKind, TextGenerationFields,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyFile {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256sum: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyDownload {
    pub file_name: String,
    #[serde(default)]
    pub file_path: String,
    pub file_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyConfig {
    #[serde(default)]
    pub files: Vec<LegacyFile>,
    #[serde(default)]
    pub download: Vec<LegacyDownload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyModelRecord {
    pub name: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub baseline: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub inpainting: bool,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub trigger: Vec<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub size_on_disk_bytes: Option<u64>,
    #[serde(default)]
    pub parameters: Option<u64>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub controlnet_style: Option<String>,
    #[serde(default)]
    pub config: LegacyConfig,
}

impl LegacyModelRecord {
    /// Convert into the v2 shape for `category`.
    pub fn into_record(self, category: ModelCategory) -> ModelRecord {
        let download = self
            .config
            .download
            .iter()
            .map(|d| DownloadRecord {
                file_name: d.file_name.clone(),
                file_url: d.file_url.clone(),
                sha256sum: self
                    .config
                    .files
                    .iter()
                    .find(|f| f.path == d.file_name || f.path == d.file_path)
                    .and_then(|f| f.sha256sum.clone()),
            })
            .collect();

        let baseline = self.baseline.unwrap_or_default();
        let kind = match category {
            ModelCategory::ImageGeneration => RecordKind::ImageGeneration(ImageGenerationFields {
                baseline,
                nsfw: self.nsfw,
                inpainting: self.inpainting,
                style: self.style,
                trigger: self.trigger,
                homepage: self.homepage,
                size_on_disk_bytes: self.size_on_disk_bytes,
            }),
            ModelCategory::TextGeneration => RecordKind::TextGeneration(TextGenerationFields {
                baseline,
                parameters: self.parameters,
                display_name: self.display_name,
                url: self.url,
                text_model_group: None,
                nsfw: self.nsfw,
                settings: None,
            }),
            ModelCategory::Controlnet => RecordKind::Controlnet(ControlnetFields {
                controlnet_style: self.controlnet_style,
            }),
            other => RecordKind::empty_for(other),
        };

        ModelRecord {
            name: self.name,
            description: self.description,
            version: self.version,
            tags: self.tags,
            config: RecordConfig { download },
            kind,
            extra: Default::default(),
        }
    }
}
