// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! In-process audit store
//!
//! Used for local runs and tests. Mirrors the table semantics: ids are
//! assigned sequentially, nothing is unique, newest-first ordering is by
//! `created_at` with the id as tie-breaker.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::{AuditRecord, AuditStore, StoreError};

#[derive(Clone)]
pub struct MemoryAuditStore {
    records: Arc<RwLock<Vec<AuditRecord>>>,
    next_id: Arc<Mutex<i64>>,
    injected_error: Arc<Mutex<Option<StoreError>>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(Mutex::new(1)),
            injected_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Insert a record as-is, assigning an id if it has none.
    /// Lets callers seed rows with an explicit `created_at`.
    pub async fn insert_record(&self, mut record: AuditRecord) -> AuditRecord {
        if record.id.is_none() {
            record.id = Some(self.allocate_id().await);
        }
        self.records.write().await.push(record.clone());
        record
    }

    /// Make the next store operation fail with `error`
    pub async fn inject_error(&self, error: StoreError) {
        *self.injected_error.lock().await = Some(error);
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn allocate_id(&self) -> i64 {
        let mut next_id = self.next_id.lock().await;
        let id = *next_id;
        *next_id += 1;
        id
    }

    async fn check_injected_error(&self) -> Result<(), StoreError> {
        match self.injected_error.lock().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn newest_first(records: &mut [AuditRecord]) {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    }
}

impl Default for MemoryAuditStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn save(
        &self,
        url: &str,
        email: &str,
        analysis: &str,
    ) -> Result<AuditRecord, StoreError> {
        self.check_injected_error().await?;

        let record = AuditRecord {
            id: Some(self.allocate_id().await),
            url: url.to_string(),
            email: email.to_string(),
            analysis: analysis.to_string(),
            created_at: Utc::now(),
        };
        self.records.write().await.push(record.clone());

        debug!("Saved audit {:?} for {} ({})", record.id, url, email);
        Ok(record)
    }

    async fn find_latest_by_url_and_email(
        &self,
        url: &str,
        email: &str,
    ) -> Result<Option<AuditRecord>, StoreError> {
        self.check_injected_error().await?;

        let mut matches: Vec<AuditRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.url == url && r.email == email)
            .cloned()
            .collect();
        Self::newest_first(&mut matches);
        Ok(matches.into_iter().next())
    }

    async fn find_all_by_email(&self, email: &str) -> Result<Vec<AuditRecord>, StoreError> {
        self.check_injected_error().await?;

        let mut matches: Vec<AuditRecord> = self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.email == email)
            .cloned()
            .collect();
        Self::newest_first(&mut matches);
        Ok(matches)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
