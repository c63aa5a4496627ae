// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use super::schema::SchemaError;
use crate::fetcher::FetchError;

/// Failures while producing an analysis
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// Page content could not be retrieved
    #[error("Analysis failed: {0}")]
    Fetch(#[from] FetchError),

    /// Model provider call failed (network, auth, quota, non-success status)
    #[error("Analysis failed: remote call failed: {0}")]
    RemoteCall(String),

    /// Model output is not valid JSON or violates the schema
    #[error("Analysis failed: malformed response: {0}")]
    MalformedResponse(String),
}

impl From<SchemaError> for AnalysisError {
    fn from(err: SchemaError) -> Self {
        AnalysisError::MalformedResponse(err.to_string())
    }
}
