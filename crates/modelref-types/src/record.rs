//! Reference records as served by the v2 listing endpoints.
//!
//! A record is a set of common fields plus a category specific part selected
//! by the `record_type` discriminant:
//!
//! ```json
//! {
//!   "name": "Deliberate",
//!   "record_type": "image_generation",
//!   "baseline": "stable_diffusion_1",
//!   "config": { "download": [{ "file_name": "d.safetensors", "file_url": "https://..." }] }
//! }
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::category::ModelCategory;
use crate::error::{FieldError, RecordError};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

static SHA256_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Fa-f0-9]{64}$").expect("valid sha256 regex"));

/// One downloadable file of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DownloadRecord {
    #[validate(length(min = 1, message = "file name is required"))]
    pub file_name: String,
    #[validate(url(message = "must be a valid URL"))]
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *SHA256_RE, message = "must be 64 hexadecimal characters"))]
    pub sha256sum: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct RecordConfig {
    #[serde(default)]
    #[validate(nested)]
    pub download: Vec<DownloadRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct ImageGenerationFields {
    #[validate(length(min = 1, message = "baseline is required"))]
    pub baseline: String,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub inpainting: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trigger: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_on_disk_bytes: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct TextGenerationFields {
    #[validate(length(min = 1, message = "baseline is required"))]
    pub baseline: String,
    /// Parameter count of the underlying model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1, message = "parameter count must be positive"))]
    pub parameters: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Explicit group name shared by all variations of the same model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_model_group: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlnetFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controlnet_style: Option<String>,
}

/// Category specific part of a record, discriminated by `record_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record_type", rename_all = "snake_case")]
pub enum RecordKind {
    ImageGeneration(ImageGenerationFields),
    TextGeneration(TextGenerationFields),
    Controlnet(ControlnetFields),
    Clip,
    Blip,
    Codeformer,
    Esrgan,
    Gfpgan,
    SafetyChecker,
    Miscellaneous,
    Lora,
    Ti,
    VideoGeneration,
    AudioGeneration,
}

impl RecordKind {
    pub fn category(&self) -> ModelCategory {
        match self {
            RecordKind::ImageGeneration(_) => ModelCategory::ImageGeneration,
            RecordKind::TextGeneration(_) => ModelCategory::TextGeneration,
            RecordKind::Controlnet(_) => ModelCategory::Controlnet,
            RecordKind::Clip => ModelCategory::Clip,
            RecordKind::Blip => ModelCategory::Blip,
            RecordKind::Codeformer => ModelCategory::Codeformer,
            RecordKind::Esrgan => ModelCategory::Esrgan,
            RecordKind::Gfpgan => ModelCategory::Gfpgan,
            RecordKind::SafetyChecker => ModelCategory::SafetyChecker,
            RecordKind::Miscellaneous => ModelCategory::Miscellaneous,
            RecordKind::Lora => ModelCategory::Lora,
            RecordKind::Ti => ModelCategory::Ti,
            RecordKind::VideoGeneration => ModelCategory::VideoGeneration,
            RecordKind::AudioGeneration => ModelCategory::AudioGeneration,
        }
    }

    /// Empty kind for a category; used when converting records that carry no
    /// category specific data.
    pub fn empty_for(category: ModelCategory) -> Self {
        match category {
            ModelCategory::ImageGeneration => {
                RecordKind::ImageGeneration(ImageGenerationFields::default())
            }
            ModelCategory::TextGeneration => {
                RecordKind::TextGeneration(TextGenerationFields::default())
            }
            ModelCategory::Controlnet => RecordKind::Controlnet(ControlnetFields::default()),
            ModelCategory::Clip => RecordKind::Clip,
            ModelCategory::Blip => RecordKind::Blip,
            ModelCategory::Codeformer => RecordKind::Codeformer,
            ModelCategory::Esrgan => RecordKind::Esrgan,
            ModelCategory::Gfpgan => RecordKind::Gfpgan,
            ModelCategory::SafetyChecker => RecordKind::SafetyChecker,
            ModelCategory::Miscellaneous => RecordKind::Miscellaneous,
            ModelCategory::Lora => RecordKind::Lora,
            ModelCategory::Ti => RecordKind::Ti,
            ModelCategory::VideoGeneration => RecordKind::VideoGeneration,
            ModelCategory::AudioGeneration => RecordKind::AudioGeneration,
        }
    }
}

/// A model reference record.
///
/// Keys this crate does not model are kept in `extra` and written back
/// unchanged, so saving a record never drops upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "RecordWire")]
pub struct ModelRecord {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(nested)]
    pub config: RecordConfig,
    #[serde(flatten)]
    pub kind: RecordKind,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Deserialization shape of [`ModelRecord`]. The second flattened field sees
/// every key the struct itself does not name, including the ones `kind`
/// consumed; those are removed before the record is built.
#[derive(Deserialize)]
struct RecordWire {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    config: RecordConfig,
    #[serde(flatten)]
    kind: RecordKind,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<RecordWire> for ModelRecord {
    fn from(wire: RecordWire) -> Self {
        let mut extra = wire.extra;
        if let Ok(Value::Object(kind)) = serde_json::to_value(&wire.kind) {
            for key in kind.keys() {
                extra.remove(key);
            }
        }
        extra.remove("record_type");
        Self {
            name: wire.name,
            description: wire.description,
            version: wire.version,
            tags: wire.tags,
            config: wire.config,
            kind: wire.kind,
            extra,
        }
    }
}

impl ModelRecord {
    pub fn new(name: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
            tags: Vec::new(),
            config: RecordConfig::default(),
            kind,
            extra: Map::new(),
        }
    }

    pub fn category(&self) -> ModelCategory {
        self.kind.category()
    }

    /// Baseline architecture, for the kinds that carry one.
    pub fn baseline(&self) -> Option<&str> {
        let baseline = match &self.kind {
            RecordKind::ImageGeneration(f) => f.baseline.as_str(),
            RecordKind::TextGeneration(f) => f.baseline.as_str(),
            _ => return None,
        };
        (!baseline.is_empty()).then_some(baseline)
    }

    /// Size on disk in GiB, only known for image generation records.
    pub fn size_gb(&self) -> Option<f64> {
        match &self.kind {
            RecordKind::ImageGeneration(f) => f.size_on_disk_bytes.map(|b| b as f64 / BYTES_PER_GB),
            _ => None,
        }
    }

    pub fn nsfw(&self) -> Option<bool> {
        match &self.kind {
            RecordKind::ImageGeneration(f) => Some(f.nsfw),
            RecordKind::TextGeneration(f) => Some(f.nsfw),
            _ => None,
        }
    }

    pub fn text_fields(&self) -> Option<&TextGenerationFields> {
        match &self.kind {
            RecordKind::TextGeneration(f) => Some(f),
            _ => None,
        }
    }

    pub fn download_urls(&self) -> impl Iterator<Item = &str> {
        self.config.download.iter().map(|d| d.file_url.as_str())
    }

    /// Validate all fields, including the category specific ones.
    ///
    /// Every violation is reported; nothing short-circuits on the first one.
    pub fn check(&self) -> Result<(), RecordError> {
        let mut errors = Vec::new();
        if let Err(e) = self.validate() {
            flatten_errors("", &e, &mut errors);
        }
        let kind_result = match &self.kind {
            RecordKind::ImageGeneration(f) => f.validate(),
            RecordKind::TextGeneration(f) => f.validate(),
            _ => Ok(()),
        };
        if let Err(e) = kind_result {
            flatten_errors("", &e, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort();
            Err(RecordError::Invalid(errors))
        }
    }
}

/// Parse a record submitted for `category` and validate it.
pub fn parse_record(category: ModelCategory, json: &str) -> Result<ModelRecord, RecordError> {
    let record: ModelRecord = serde_json::from_str(json)?;
    if record.category() != category {
        return Err(RecordError::CategoryMismatch {
            expected: category,
            found: record.category(),
        });
    }
    record.check()?;
    Ok(record)
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    out.push(FieldError {
                        field: path.clone(),
                        message,
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten_errors(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}
