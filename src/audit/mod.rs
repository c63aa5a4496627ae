// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Website audit submissions
//!
//! Ties the store, fetcher and analyzer together behind [`AuditService`],
//! with the per-submission state machine in [`flow`].

pub mod errors;
pub mod flow;
pub mod service;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;

use crate::analysis::{ChatCompletionClient, ModelAnalyzer};
use crate::call_options::CallOptions;
use crate::config::AppConfig;
use crate::fetcher::HttpPageFetcher;
use crate::store;

pub use errors::{AuditError, GENERIC_FAILURE_NOTICE};
pub use flow::{Clock, FixedClock, ResultSource, Submission, SubmissionPhase, SystemClock};
pub use service::{AuditService, SubmissionOutcome};

/// Wire up a service from configuration: one store handle, one HTTP
/// fetcher and one model client, shared by every submission.
pub fn build_service(config: &AppConfig) -> Result<AuditService> {
    let cache_ttl = config.cache_ttl().map_err(|e| anyhow!(e))?;
    let store = store::connect(&config.store)?;
    let fetcher = Arc::new(HttpPageFetcher::new()?);
    let client = ChatCompletionClient::new(&config.model.base_url, config.model.api_key.clone())?
        .with_model(&config.model.model);
    let analyzer = Arc::new(ModelAnalyzer::new(client));

    info!(
        "Audit service ready: store={}, cache_ttl={}s",
        store.backend_name(),
        config.cache_ttl_secs
    );

    Ok(AuditService::new(store, fetcher, analyzer)
        .with_cache_ttl(cache_ttl)
        .with_fetch_options(CallOptions::from_timeout_secs(config.fetch_timeout_secs))
        .with_model_options(CallOptions::from_timeout_secs(config.model.timeout_secs)))
}
