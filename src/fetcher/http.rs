// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plain HTTP GET fetcher backed by reqwest

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::{FetchError, PageFetcher};
use crate::call_options::CallOptions;

/// Fetches pages with a bare `GET`: no custom headers, no size cap, and the
/// body is read as text whatever the content type.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Create a fetcher with a default reqwest client
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Create a fetcher that shares an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str, options: &CallOptions) -> Result<String, FetchError> {
        debug!("Fetching content from: {}", url);

        // One bound covers send, status check and body read
        let call = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::new(url, e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::new(
                    url,
                    format!("Request failed with status code {}", status.as_u16()),
                ));
            }

            let body = response
                .text()
                .await
                .map_err(|e| FetchError::new(url, e.to_string()))?;
            Ok::<String, FetchError>(body)
        };

        let body = options
            .run(call)
            .await
            .map_err(|interrupted| FetchError::new(url, interrupted.to_string()))??;

        info!("Fetched {} bytes from: {}", body.len(), url);
        Ok(body)
    }
}
