//! Model reference categories.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::UnknownCategory;

/// A catalog category. Every reference record belongs to exactly one.
///
/// The string form (`image_generation`, `text_generation`, ...) is what the
/// reference service uses both in URLs and in the `record_type` discriminant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelCategory {
    ImageGeneration,
    TextGeneration,
    Clip,
    Blip,
    Codeformer,
    Controlnet,
    Esrgan,
    Gfpgan,
    SafetyChecker,
    Miscellaneous,
    Lora,
    Ti,
    VideoGeneration,
    AudioGeneration,
}

impl ModelCategory {
    /// Parse a category name as it appears in URLs and CLI arguments.
    pub fn parse(raw: &str) -> Result<Self, UnknownCategory> {
        raw.trim()
            .parse()
            .map_err(|_| UnknownCategory(raw.to_owned()))
    }

    /// Only text models come in backend/quantization variations that the
    /// console folds into a single row.
    pub fn supports_grouping(self) -> bool {
        matches!(self, ModelCategory::TextGeneration)
    }

    /// File name used when exporting the audit table of this category.
    pub fn export_file_name(self) -> String {
        format!("model-audit-{self}.csv")
    }
}
