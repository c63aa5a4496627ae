// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! PostgREST-backed audit store
//!
//! Talks to a hosted Postgres table through its REST gateway (PostgREST, as
//! exposed by Supabase) under `{base_url}/rest/v1/{table}`, authenticated
//! with an access key sent as both `apikey` and bearer token.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{AuditRecord, AuditStore, StoreError};

/// Location and credentials of the REST gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestStoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Access key (anon or service key)
    pub api_key: String,
    /// Table name (default: `audits`)
    pub table: String,
    /// Request timeout in seconds (None = transport default)
    pub timeout_secs: Option<u64>,
}

impl RestStoreConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: "audits".to_string(),
            timeout_secs: None,
        }
    }

    fn table_endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

#[derive(Serialize)]
struct NewAuditRow<'a> {
    url: &'a str,
    email: &'a str,
    analysis: &'a str,
    created_at: String,
}

pub struct RestAuditStore {
    client: Client,
    config: RestStoreConfig,
    endpoint: String,
}

impl RestAuditStore {
    pub fn new(config: RestStoreConfig) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let endpoint = config.table_endpoint();
        info!("REST audit store configured: {}", endpoint);

        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Audit store returned {}: {}", status, body);
        Err(match status {
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                StoreError::Constraint(format!("{} {}", status.as_u16(), body))
            }
            _ => StoreError::Query(format!("{} {}", status.as_u16(), body)),
        })
    }

    async fn read_rows(response: Response) -> Result<Vec<AuditRecord>, StoreError> {
        response
            .json::<Vec<AuditRecord>>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn eq(value: &str) -> String {
        format!("eq.{}", value)
    }
}

#[async_trait]
impl AuditStore for RestAuditStore {
    async fn save(
        &self,
        url: &str,
        email: &str,
        analysis: &str,
    ) -> Result<AuditRecord, StoreError> {
        let row = NewAuditRow {
            url,
            email,
            analysis,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let request = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=representation")
            .json(&row);
        let rows = Self::read_rows(self.send(request).await?).await?;

        let record = rows.into_iter().next().ok_or_else(|| {
            StoreError::Query("insert returned no representation".to_string())
        })?;
        debug!("Saved audit {:?} for {} ({})", record.id, url, email);
        Ok(record)
    }

    async fn find_latest_by_url_and_email(
        &self,
        url: &str,
        email: &str,
    ) -> Result<Option<AuditRecord>, StoreError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("select", "*".to_string()),
            ("url", Self::eq(url)),
            ("email", Self::eq(email)),
            ("order", "created_at.desc".to_string()),
            ("limit", "1".to_string()),
        ]);

        // An empty array is the "no rows" case, not an error
        let rows = Self::read_rows(self.send(request).await?).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_all_by_email(&self, email: &str) -> Result<Vec<AuditRecord>, StoreError> {
        let request = self.client.get(&self.endpoint).query(&[
            ("select", "*".to_string()),
            ("email", Self::eq(email)),
            ("order", "created_at.desc".to_string()),
        ]);

        Self::read_rows(self.send(request).await?).await
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}
