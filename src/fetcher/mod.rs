// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Page content fetching
//!
//! Retrieves the raw HTML of a submitted website so it can be handed to the
//! analysis client verbatim.
//!
//! ```text
//! URL → PageFetcher (GET) → body text → Analyzer
//! ```

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::call_options::CallOptions;

pub use http::HttpPageFetcher;

/// Any failure retrieving a page: transport error, non-success status,
/// timeout or cancellation. All collapse into this one kind.
#[derive(Debug, Clone, Error)]
#[error("Failed to fetch website content: {message}")]
pub struct FetchError {
    /// URL that was being fetched
    pub url: String,
    /// Underlying failure message
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// Source of raw page content
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the response body as text
    async fn fetch(&self, url: &str, options: &CallOptions) -> Result<String, FetchError>;
}
