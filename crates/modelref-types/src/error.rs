use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::category::ModelCategory;

/// A single failed validation rule, addressed by a dotted field path such as
/// `config.download[0].file_url`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors produced while parsing or validating a submitted record.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The submitted document is not valid JSON or does not match the record shape.
    #[error("invalid record JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The record's `record_type` does not belong to the target category.
    #[error("record type {found} does not belong to category {expected}")]
    CategoryMismatch {
        expected: ModelCategory,
        found: ModelCategory,
    },

    /// One or more fields failed validation.
    #[error("record failed validation: {}", join(.0))]
    Invalid(Vec<FieldError>),
}

fn join(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Returned when a category name is not one of [`ModelCategory`]'s variants.
#[derive(Debug, Error)]
#[error("unknown model category: {0}")]
pub struct UnknownCategory(pub String);
