// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end submissions: real fetcher and model client against local
//! servers, memory store underneath.

use axum::{http::StatusCode, response::Html, routing::{get, post}, Json, Router};
use chrono::{Duration, Utc};
use fabstir_ux_audit::analysis::{parse_and_validate, ChatCompletionClient, ModelAnalyzer};
use fabstir_ux_audit::audit::{AuditService, ResultSource, SubmissionPhase, GENERIC_FAILURE_NOTICE};
use fabstir_ux_audit::fetcher::HttpPageFetcher;
use fabstir_ux_audit::store::{AuditRecord, AuditStore, MemoryAuditStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

const MODEL_ANSWER: &str = r#"{"overview":"ok","issues":[],"recommendations":["Add alt text"]}"#;

struct Harness {
    site_url: String,
    store: MemoryAuditStore,
    service: AuditService,
    page_hits: Arc<AtomicUsize>,
    model_hits: Arc<AtomicUsize>,
}

/// Helper: local site + local model provider wired into a service
async fn harness(model_answer: &'static str) -> Harness {
    let page_hits = Arc::new(AtomicUsize::new(0));
    let model_hits = Arc::new(AtomicUsize::new(0));

    let hits = page_hits.clone();
    let site = Router::new()
        .route(
            "/",
            get(move || {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Html("<html><body><img src=\"hero.png\"></body></html>")
                }
            }),
        )
        .route("/down", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));

    let hits = model_hits.clone();
    let provider = Router::new().route(
        "/chat/completions",
        post(move |Json(_): Json<Value>| {
            let hits = hits.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": model_answer } }]
                }))
            }
        }),
    );

    let site_url = serve(site).await;
    let provider_url = serve(provider).await;

    let store = MemoryAuditStore::new();
    let client = ChatCompletionClient::new(&provider_url, Some("sk-test".to_string())).unwrap();
    let service = AuditService::new(
        Arc::new(store.clone()),
        Arc::new(HttpPageFetcher::new().unwrap()),
        Arc::new(ModelAnalyzer::new(client)),
    );

    Harness {
        site_url,
        store,
        service,
        page_hits,
        model_hits,
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_first_submission_analyzes_and_second_hits_cache() {
    let h = harness(MODEL_ANSWER).await;
    let url = format!("{}/", h.site_url);

    let first = assert_ok!(h.service.submit(&url, "a@b.com").await);
    assert_eq!(first.source, ResultSource::Fresh);
    assert_eq!(first.analysis.overview, "ok");
    assert_eq!(first.analysis.recommendations, vec!["Add alt text".to_string()]);
    assert_eq!(h.store.len().await, 1);
    assert_eq!(
        first.trail,
        vec![
            SubmissionPhase::Idle,
            SubmissionPhase::Checking,
            SubmissionPhase::Fetching,
            SubmissionPhase::Analyzing,
            SubmissionPhase::Persisting,
            SubmissionPhase::Done,
        ]
    );

    // Stored text is itself a valid analysis
    assert_eq!(assert_ok!(parse_and_validate(&first.record.analysis)), first.analysis);

    let second = assert_ok!(h.service.submit(&url, "a@b.com").await);
    assert_eq!(second.source, ResultSource::Cache);
    assert_eq!(second.analysis, first.analysis);
    assert_eq!(second.record.id, first.record.id);

    assert_eq!(h.page_hits.load(Ordering::SeqCst), 1);
    assert_eq!(h.model_hits.load(Ordering::SeqCst), 1);
    assert_eq!(h.store.len().await, 1);
}

#[tokio::test]
async fn test_cache_is_scoped_to_email() {
    let h = harness(MODEL_ANSWER).await;
    let url = format!("{}/", h.site_url);

    assert_ok!(h.service.submit(&url, "a@b.com").await);
    let other = assert_ok!(h.service.submit(&url, "c@d.com").await);

    assert_eq!(other.source, ResultSource::Fresh);
    assert_eq!(h.model_hits.load(Ordering::SeqCst), 2);
    assert_eq!(h.store.len().await, 2);
}

#[tokio::test]
async fn test_stale_record_triggers_new_analysis() {
    let h = harness(MODEL_ANSWER).await;
    let url = format!("{}/", h.site_url);

    let old = h
        .store
        .insert_record(AuditRecord {
            id: None,
            url: url.clone(),
            email: "a@b.com".to_string(),
            analysis: r#"{"overview":"old","issues":[],"recommendations":[]}"#.to_string(),
            created_at: Utc::now() - Duration::hours(25),
        })
        .await;

    let outcome = assert_ok!(h.service.submit(&url, "a@b.com").await);
    assert_eq!(outcome.source, ResultSource::Fresh);
    assert_eq!(outcome.analysis.overview, "ok");
    assert_ne!(outcome.record.id, old.id);

    // Old row is kept; the new one wins lookups
    assert_eq!(h.store.len().await, 2);
    let latest = h
        .store
        .find_latest_by_url_and_email(&url, "a@b.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, outcome.record.id);
}

#[tokio::test]
async fn test_unreachable_page_fails_without_model_call() {
    let h = harness(MODEL_ANSWER).await;
    let url = format!("{}/down", h.site_url);

    let err = assert_err!(h.service.submit(&url, "a@b.com").await);
    assert_eq!(err.user_message(), GENERIC_FAILURE_NOTICE);
    assert!(err.to_string().contains("Request failed with status code 503"));

    assert_eq!(h.model_hits.load(Ordering::SeqCst), 0);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn test_invalid_model_output_is_not_stored() {
    let h = harness(r#"{"overview":"ok","issues":"none","recommendations":[]}"#).await;
    let url = format!("{}/", h.site_url);

    let err = assert_err!(h.service.submit(&url, "a@b.com").await);
    assert_eq!(err.user_message(), GENERIC_FAILURE_NOTICE);
    assert!(h.store.is_empty().await);

    // Nothing cached, so a retry goes back to the model
    assert_err!(h.service.submit(&url, "a@b.com").await);
    assert_eq!(h.model_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_history_lists_newest_first() {
    let h = harness(MODEL_ANSWER).await;

    assert_ok!(h.service.submit(&format!("{}/", h.site_url), "a@b.com").await);
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    assert_ok!(h.service.submit(&format!("{}/?v=2", h.site_url), "a@b.com").await);

    let history = assert_ok!(h.service.history("a@b.com").await);
    assert_eq!(history.len(), 2);
    assert!(history[0].url.ends_with("?v=2"));
    assert!(assert_ok!(h.service.history("nobody@b.com").await).is_empty());
}
