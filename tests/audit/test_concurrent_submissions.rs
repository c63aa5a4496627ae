// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Overlapping submissions for the same URL + email
//!
//! Nothing serializes submissions, so two that both miss the cache both
//! insert. Lookups afterwards return the newest record.

use async_trait::async_trait;
use fabstir_ux_audit::analysis::{AnalysisError, AnalysisResult, Analyzer};
use fabstir_ux_audit::audit::{AuditService, ResultSource};
use fabstir_ux_audit::call_options::CallOptions;
use fabstir_ux_audit::fetcher::{FetchError, PageFetcher};
use fabstir_ux_audit::store::{AuditStore, MemoryAuditStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;

/// Fetcher that holds every caller until `parties` fetches are in flight
struct RendezvousFetcher {
    barrier: Barrier,
    calls: AtomicUsize,
}

#[async_trait]
impl PageFetcher for RendezvousFetcher {
    async fn fetch(&self, url: &str, options: &CallOptions) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        options
            .run(self.barrier.wait())
            .await
            .map_err(|interrupted| FetchError::new(url, interrupted.to_string()))?;
        Ok("<html></html>".to_string())
    }
}

struct FixedAnalyzer;

#[async_trait]
impl Analyzer for FixedAnalyzer {
    async fn analyze(
        &self,
        _content: &str,
        _options: &CallOptions,
    ) -> Result<AnalysisResult, AnalysisError> {
        Ok(AnalysisResult {
            overview: "ok".to_string(),
            issues: vec![],
            recommendations: vec!["Add alt text".to_string()],
        })
    }
}

#[tokio::test]
async fn test_overlapping_submissions_both_insert() {
    let store = MemoryAuditStore::new();
    let fetcher = Arc::new(RendezvousFetcher {
        barrier: Barrier::new(2),
        calls: AtomicUsize::new(0),
    });
    let service = AuditService::new(Arc::new(store.clone()), fetcher.clone(), Arc::new(FixedAnalyzer));

    let (first, second) = futures::future::join(
        service.submit("https://example.com", "a@b.com"),
        service.submit("https://example.com", "a@b.com"),
    )
    .await;
    let first = first.unwrap();
    let second = second.unwrap();

    assert_eq!(first.source, ResultSource::Fresh);
    assert_eq!(second.source, ResultSource::Fresh);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.len().await, 2);

    let newest = [&first.record, &second.record]
        .into_iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        .unwrap();
    let latest = store
        .find_latest_by_url_and_email("https://example.com", "a@b.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, newest.id);

    // A third submission is now a cache hit
    let third = service.submit("https://example.com", "a@b.com").await.unwrap();
    assert_eq!(third.source, ResultSource::Cache);
    assert_eq!(third.record.id, latest.id);
}

#[tokio::test]
async fn test_single_submission_writes_exactly_one_record() {
    let store = MemoryAuditStore::new();
    let fetcher = Arc::new(RendezvousFetcher {
        barrier: Barrier::new(1),
        calls: AtomicUsize::new(0),
    });
    let service = AuditService::new(Arc::new(store.clone()), fetcher, Arc::new(FixedAnalyzer));

    service.submit("https://example.com", "a@b.com").await.unwrap();
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_cancelled_submission_stores_nothing() {
    let store = MemoryAuditStore::new();
    // Barrier of 2 with a single caller never releases
    let fetcher = Arc::new(RendezvousFetcher {
        barrier: Barrier::new(2),
        calls: AtomicUsize::new(0),
    });
    let service = AuditService::new(Arc::new(store.clone()), fetcher, Arc::new(FixedAnalyzer));

    let token = tokio_util::sync::CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = service
        .submit_with_cancel("https://example.com", "a@b.com", token)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("cancelled"), "{}", err);
    assert!(store.is_empty().await);
}
