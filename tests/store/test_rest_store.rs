// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! REST audit store against a local PostgREST-style gateway
//!
//! The gateway keeps rows in memory and honours the subset of PostgREST the
//! store uses: `eq.` filters, `order=created_at.desc`, `limit` and
//! `Prefer: return=representation`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{TimeZone, Utc};
use fabstir_ux_audit::store::{AuditStore, RestAuditStore, RestStoreConfig, StoreError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const KEY: &str = "service-key";

#[derive(Clone, Default)]
struct Gateway {
    rows: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<Mutex<i64>>,
    prefer_headers: Arc<Mutex<Vec<String>>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    let apikey = headers.get("apikey").and_then(|v| v.to_str().ok());
    let bearer = headers.get("authorization").and_then(|v| v.to_str().ok());
    apikey == Some(KEY) && bearer == Some(format!("Bearer {}", KEY).as_str())
}

fn table_error(table: &str) -> Option<Response> {
    match table {
        "audits" => None,
        "locked" => Some(
            (
                StatusCode::CONFLICT,
                Json(json!({"code": "23505", "message": "duplicate key value"})),
            )
                .into_response(),
        ),
        _ => Some(
            (
                StatusCode::NOT_FOUND,
                Json(json!({"code": "42P01", "message": "relation does not exist"})),
            )
                .into_response(),
        ),
    }
}

async fn insert(
    State(gateway): State<Gateway>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Json(mut row): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(error) = table_error(&table) {
        return error;
    }
    if let Some(prefer) = headers.get("prefer").and_then(|v| v.to_str().ok()) {
        gateway.prefer_headers.lock().await.push(prefer.to_string());
    }

    let mut next_id = gateway.next_id.lock().await;
    *next_id += 1;
    row["id"] = json!(*next_id);
    gateway.rows.lock().await.push(row.clone());

    (StatusCode::CREATED, Json(json!([row]))).into_response()
}

async fn select(
    State(gateway): State<Gateway>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(error) = table_error(&table) {
        return error;
    }

    let mut rows: Vec<Value> = gateway
        .rows
        .lock()
        .await
        .iter()
        .filter(|row| {
            ["url", "email"].iter().all(|column| match params.get(*column) {
                Some(filter) => {
                    let expected = filter.strip_prefix("eq.").unwrap_or(filter);
                    row[*column] == expected
                }
                None => true,
            })
        })
        .cloned()
        .collect();

    if params.get("order").map(String::as_str) == Some("created_at.desc") {
        rows.sort_by(|a, b| {
            b["created_at"]
                .as_str()
                .unwrap_or_default()
                .cmp(a["created_at"].as_str().unwrap_or_default())
        });
    }
    if let Some(limit) = params.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        rows.truncate(limit);
    }

    Json(Value::Array(rows)).into_response()
}

async fn spawn_gateway() -> (String, Gateway) {
    let gateway = Gateway::default();
    let app = Router::new()
        .route("/rest/v1/:table", get(select).post(insert))
        .with_state(gateway.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/", addr), gateway)
}

fn store_for(base_url: &str, key: &str, table: &str) -> RestAuditStore {
    let mut config = RestStoreConfig::new(base_url, key);
    config.table = table.to_string();
    RestAuditStore::new(config).unwrap()
}

#[tokio::test]
async fn test_save_returns_inserted_row() {
    let (base_url, gateway) = spawn_gateway().await;
    let store = store_for(&base_url, KEY, "audits");

    let record = store
        .save("https://example.com", "a@b.com", r#"{"overview":"ok"}"#)
        .await
        .unwrap();

    assert_eq!(record.id, Some(1));
    assert_eq!(record.url, "https://example.com");
    assert_eq!(record.analysis, r#"{"overview":"ok"}"#);
    assert!(Utc::now().signed_duration_since(record.created_at) < chrono::Duration::minutes(1));
    assert_eq!(
        gateway.prefer_headers.lock().await.as_slice(),
        &["return=representation".to_string()]
    );
}

#[tokio::test]
async fn test_find_latest_none_when_no_rows() {
    let (base_url, _) = spawn_gateway().await;
    let store = store_for(&base_url, KEY, "audits");

    let latest = store
        .find_latest_by_url_and_email("https://example.com", "a@b.com")
        .await
        .unwrap();

    assert!(latest.is_none());
}

#[tokio::test]
async fn test_find_latest_filters_and_orders() {
    let (base_url, gateway) = spawn_gateway().await;
    {
        let mut rows = gateway.rows.lock().await;
        rows.push(json!({"id": 10, "url": "https://example.com", "email": "a@b.com",
            "analysis": "older", "created_at": "2025-01-01T10:00:00.000Z"}));
        rows.push(json!({"id": 11, "url": "https://example.com", "email": "a@b.com",
            "analysis": "newer", "created_at": "2025-01-02T10:00:00.000Z"}));
        rows.push(json!({"id": 12, "url": "https://example.com", "email": "other@b.com",
            "analysis": "someone else", "created_at": "2025-01-03T10:00:00.000Z"}));
    }
    let store = store_for(&base_url, KEY, "audits");

    let latest = store
        .find_latest_by_url_and_email("https://example.com", "a@b.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(latest.id, Some(11));
    assert_eq!(latest.analysis, "newer");
    assert_eq!(
        latest.created_at,
        Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_naive_timestamps_read_as_utc() {
    let (base_url, gateway) = spawn_gateway().await;
    gateway.rows.lock().await.push(json!({"id": 1, "url": "https://example.com",
        "email": "a@b.com", "analysis": "x", "created_at": "2025-03-04T05:06:07.123456"}));
    let store = store_for(&base_url, KEY, "audits");

    let latest = store
        .find_latest_by_url_and_email("https://example.com", "a@b.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(latest.created_at.timestamp(), 1_741_064_767);
}

#[tokio::test]
async fn test_history_newest_first() {
    let (base_url, _) = spawn_gateway().await;
    let store = store_for(&base_url, KEY, "audits");

    store.save("https://one.test", "a@b.com", "1").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    store.save("https://two.test", "a@b.com", "2").await.unwrap();
    store.save("https://three.test", "z@b.com", "3").await.unwrap();

    let history = store.find_all_by_email("a@b.com").await.unwrap();
    let urls: Vec<&str> = history.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["https://two.test", "https://one.test"]);
}

#[tokio::test]
async fn test_wrong_key_is_query_error() {
    let (base_url, _) = spawn_gateway().await;
    let store = store_for(&base_url, "wrong-key", "audits");

    let err = store
        .find_latest_by_url_and_email("https://example.com", "a@b.com")
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Query(ref m) if m.starts_with("401")), "{:?}", err);
}

#[tokio::test]
async fn test_conflict_is_constraint_error() {
    let (base_url, _) = spawn_gateway().await;
    let store = store_for(&base_url, KEY, "locked");

    let err = store
        .save("https://example.com", "a@b.com", "{}")
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Constraint(_)), "{:?}", err);
}

#[tokio::test]
async fn test_missing_table_is_query_error() {
    let (base_url, _) = spawn_gateway().await;
    let store = store_for(&base_url, KEY, "nope");

    let err = store.find_all_by_email("a@b.com").await.unwrap_err();
    assert!(matches!(err, StoreError::Query(_)));
}
