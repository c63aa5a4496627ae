// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Audit orchestration: cache check → fetch → analyze → persist
//!
//! This is the only place submission failures are caught. Everything below
//! propagates; callers get an [`AuditError`] whose user-facing message is
//! always the same generic notice.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::AuditError;
use super::flow::{Clock, ResultSource, Submission, SubmissionPhase, SystemClock};
use crate::analysis::{parse_and_validate, to_stored_text, AnalysisError, AnalysisResult, Analyzer};
use crate::call_options::CallOptions;
use crate::fetcher::PageFetcher;
use crate::store::{AuditRecord, AuditStore, StoreError};

/// Completed submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub submission_id: Uuid,
    pub source: ResultSource,
    pub analysis: AnalysisResult,
    pub record: AuditRecord,
    pub trail: Vec<SubmissionPhase>,
}

/// Runs submissions against shared store, fetcher and analyzer handles.
///
/// Submissions are independent: there is no locking across them, so two
/// concurrent submissions for the same pair can both miss the cache and both
/// insert. Later lookups see the record with the greatest `created_at`.
pub struct AuditService {
    store: Arc<dyn AuditStore>,
    fetcher: Arc<dyn PageFetcher>,
    analyzer: Arc<dyn Analyzer>,
    clock: Arc<dyn Clock>,
    cache_ttl: Duration,
    fetch_options: CallOptions,
    model_options: CallOptions,
}

impl AuditService {
    pub fn new(
        store: Arc<dyn AuditStore>,
        fetcher: Arc<dyn PageFetcher>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            store,
            fetcher,
            analyzer,
            clock: Arc::new(SystemClock),
            cache_ttl: Duration::hours(24),
            fetch_options: CallOptions::default(),
            model_options: CallOptions::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_fetch_options(mut self, options: CallOptions) -> Self {
        self.fetch_options = options;
        self
    }

    pub fn with_model_options(mut self, options: CallOptions) -> Self {
        self.model_options = options;
        self
    }

    pub fn store(&self) -> &Arc<dyn AuditStore> {
        &self.store
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// A record is fresh while strictly younger than the cache TTL
    pub fn is_fresh(&self, record: &AuditRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.created_at) < self.cache_ttl
    }

    /// Run one submission with the service's default call options
    pub async fn submit(&self, url: &str, email: &str) -> Result<SubmissionOutcome, AuditError> {
        self.submit_with(url, email, &self.fetch_options, &self.model_options)
            .await
    }

    /// Run one submission that aborts its outbound calls when `cancel` fires
    pub async fn submit_with_cancel(
        &self,
        url: &str,
        email: &str,
        cancel: CancellationToken,
    ) -> Result<SubmissionOutcome, AuditError> {
        let fetch_options = self.fetch_options.clone().with_cancel(cancel.clone());
        let model_options = self.model_options.clone().with_cancel(cancel);
        self.submit_with(url, email, &fetch_options, &model_options)
            .await
    }

    async fn submit_with(
        &self,
        url: &str,
        email: &str,
        fetch_options: &CallOptions,
        model_options: &CallOptions,
    ) -> Result<SubmissionOutcome, AuditError> {
        let mut submission = Submission::new(url, email);
        info!(submission = %submission.id, "Audit submitted for {} ({})", url, email);

        match self
            .run(&mut submission, fetch_options, model_options)
            .await
        {
            Ok((source, analysis, record)) => {
                submission.advance(SubmissionPhase::Done);
                info!(
                    submission = %submission.id,
                    "Audit complete ({:?}): {} issues",
                    source,
                    analysis.issues.len()
                );
                Ok(SubmissionOutcome {
                    submission_id: submission.id,
                    source,
                    analysis,
                    record,
                    trail: submission.trail().to_vec(),
                })
            }
            Err(e) => {
                error!(
                    submission = %submission.id,
                    phase = ?submission.phase(),
                    "Analysis failed: {}",
                    e
                );
                submission.advance(SubmissionPhase::Error);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        submission: &mut Submission,
        fetch_options: &CallOptions,
        model_options: &CallOptions,
    ) -> Result<(ResultSource, AnalysisResult, AuditRecord), AuditError> {
        let url = submission.url.clone();
        let email = submission.email.clone();

        submission.advance(SubmissionPhase::Checking);
        if let Some(record) = self.store.find_latest_by_url_and_email(&url, &email).await? {
            if self.is_fresh(&record, self.clock.now()) {
                match parse_and_validate(&record.analysis) {
                    Ok(analysis) => {
                        submission.advance(SubmissionPhase::CacheHit);
                        info!(submission = %submission.id, "Retrieved recent analysis {:?}", record.id);
                        return Ok((ResultSource::Cache, analysis, record));
                    }
                    Err(e) => warn!(
                        submission = %submission.id,
                        "Cached audit {:?} failed validation ({}), running fresh analysis",
                        record.id,
                        e
                    ),
                }
            } else {
                debug!(submission = %submission.id, "Cached audit {:?} is stale", record.id);
            }
        }

        submission.advance(SubmissionPhase::Fetching);
        let content = self
            .fetcher
            .fetch(&url, fetch_options)
            .await
            .map_err(AnalysisError::from)?;

        submission.advance(SubmissionPhase::Analyzing);
        let analysis = self.analyzer.analyze(&content, model_options).await?;

        submission.advance(SubmissionPhase::Persisting);
        let text = to_stored_text(&analysis).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let record = self.store.save(&url, &email, &text).await?;

        Ok((ResultSource::Fresh, analysis, record))
    }

    /// All audits for an email, newest first
    pub async fn history(&self, email: &str) -> Result<Vec<AuditRecord>, AuditError> {
        Ok(self.store.find_all_by_email(email).await?)
    }
}
