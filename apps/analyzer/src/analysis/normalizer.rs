//! Response Normalizer: turns a raw model reply into a typed record.
//!
//! The only structural requirement is a top-level JSON object. Field-level
//! leniency (nulls, missing keys, numbers in text slots) lives in the record
//! models; anything they cannot absorb is a `NormalizationError`.

use serde_json::Value;
use thiserror::Error;

use crate::analysis::models::{json_kind, ResumeCategory, StructuredRecord};

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("model reply was empty")]
    Empty,

    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("model reply is {0}, expected a JSON object")]
    NotAnObject(&'static str),

    #[error("model reply does not fit the {category} schema: {source}")]
    Shape {
        category: ResumeCategory,
        #[source]
        source: serde_json::Error,
    },
}

/// Parses a raw model reply into the record shape for `category`.
pub fn normalize(raw: &str, category: ResumeCategory) -> Result<StructuredRecord, NormalizationError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(NormalizationError::Empty);
    }

    let value: Value = serde_json::from_str(body).map_err(NormalizationError::InvalidJson)?;
    if !value.is_object() {
        return Err(NormalizationError::NotAnObject(json_kind(&value)));
    }

    StructuredRecord::from_value(category, value)
        .map_err(|source| NormalizationError::Shape { category, source })
}

/// Strips a ```json / ``` header fence and a ``` footer fence, each optional.
/// Unfenced text comes back trimmed and otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}
