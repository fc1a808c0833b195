//! Shared types for the model reference console: categories, reference
//! records (v2 and legacy listing shapes), audit statistics and presets.

pub mod audit;
pub mod category;
pub mod error;
pub mod legacy;
pub mod preset;
pub mod record;

pub use audit::{
    CategoryAuditResponse, CategoryAuditSummary, DeletionRiskFlags, ModelAuditInfo, UsageTrend,
};
pub use category::ModelCategory;
pub use error::{FieldError, RecordError, UnknownCategory};
pub use legacy::LegacyModelRecord;
pub use preset::AuditPreset;
pub use record::{
    parse_record, ControlnetFields, DownloadRecord, ImageGenerationFields, ModelRecord,
    RecordConfig, RecordKind, TextGenerationFields,
};
