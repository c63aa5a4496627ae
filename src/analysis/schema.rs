// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Parsing and schema validation of model output
//!
//! Model output is accepted only if it is valid JSON and matches the
//! [`AnalysisResult`] shape exactly. There is no coercion and no repair.

use serde_json::Value;
use thiserror::Error;

use super::types::AnalysisResult;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Text is not JSON at all
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// JSON does not match the analysis shape
    #[error("schema mismatch: {0}")]
    Mismatch(String),
}

/// Parse raw model text and validate it against the analysis schema
pub fn parse_and_validate(raw: &str) -> Result<AnalysisResult, SchemaError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;
    validate_value(value)
}

/// Validate an already-parsed JSON value
pub fn validate_value(value: Value) -> Result<AnalysisResult, SchemaError> {
    if !value.is_object() {
        return Err(SchemaError::Mismatch(format!(
            "expected an object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| SchemaError::Mismatch(e.to_string()))
}

/// Serialize an analysis to the text form kept in the audit store
pub fn to_stored_text(analysis: &AnalysisResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(analysis)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
