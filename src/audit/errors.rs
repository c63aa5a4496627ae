// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::store::StoreError;

/// Notice shown to the user for any failed submission
pub const GENERIC_FAILURE_NOTICE: &str = "Analysis failed. Please try again.";

/// Any failure of a submission. Callers are not expected to branch on the
/// variant; it is kept for logging.
#[derive(Debug, Clone, Error)]
pub enum AuditError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuditError {
    /// What to show the user, whatever went wrong
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_NOTICE
    }
}
