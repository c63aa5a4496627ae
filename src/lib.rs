// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod audit;
pub mod call_options;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod store;
pub mod version;

pub use analysis::{AnalysisError, AnalysisResult, Analyzer, Issue, Severity};
pub use audit::{build_service, AuditError, AuditService, ResultSource, SubmissionOutcome};
pub use call_options::{CallOptions, Interrupted};
pub use config::AppConfig;
pub use fetcher::{FetchError, PageFetcher};
pub use store::{AuditRecord, AuditStore, StoreBackend, StoreError};
