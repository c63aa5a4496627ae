// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Audit record persistence
//!
//! One durable table of [`AuditRecord`]s keyed (non-uniquely) by URL + email.
//! Records are appended and never updated or deleted. Lookups always prefer
//! the most recent `created_at`.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryAuditStore;
pub use rest::{RestAuditStore, RestStoreConfig};

/// One stored analysis for a URL + email pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Server-assigned identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub url: String,
    pub email: String,
    /// Serialized `AnalysisResult`
    pub analysis: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Persistence failures other than "no rows"
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),
    #[error("Store constraint violation: {0}")]
    Constraint(String),
    #[error("Store query failed: {0}")]
    Query(String),
    #[error("Store serialization error: {0}")]
    Serialization(String),
}

/// Record-oriented access to the `audits` table
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append a record stamped with the current time
    async fn save(&self, url: &str, email: &str, analysis: &str)
        -> Result<AuditRecord, StoreError>;

    /// Most recent record for the pair, or `None` when there are no rows
    async fn find_latest_by_url_and_email(
        &self,
        url: &str,
        email: &str,
    ) -> Result<Option<AuditRecord>, StoreError>;

    /// All records for an email, newest first
    async fn find_all_by_email(&self, email: &str) -> Result<Vec<AuditRecord>, StoreError>;

    /// Backend name for logging and health output
    fn backend_name(&self) -> &'static str;
}

/// Storage backend selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Rest(RestStoreConfig),
}

/// Open the configured backend
pub fn connect(backend: &StoreBackend) -> Result<Arc<dyn AuditStore>, StoreError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryAuditStore::new())),
        StoreBackend::Rest(config) => Ok(Arc::new(RestAuditStore::new(config.clone())?)),
    }
}

/// Timestamps are written as RFC 3339. On read, a naive timestamp (a
/// `timestamp` column without zone) is taken as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Ok(naive.and_utc());
            }
        }
        Err(format!("unrecognised timestamp: {}", raw))
    }
}
