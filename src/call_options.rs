// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-call timeout and cancellation for outbound requests
//!
//! Both the page fetch and the model call take a [`CallOptions`]. The default
//! is unbounded: no timeout and no cancellation token, leaving limits to the
//! underlying transport.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Timeout and cancellation settings for a single outbound call
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Upper bound on the call duration (None = no limit)
    pub timeout: Option<Duration>,
    /// Token that aborts the call when cancelled
    pub cancel: Option<CancellationToken>,
}

/// Why a bounded call did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupted {
    TimedOut(Duration),
    Cancelled,
}

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(limit) => write!(f, "timed out after {}ms", limit.as_millis()),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for Interrupted {}

impl CallOptions {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build options from an optional timeout in seconds (config style)
    pub fn from_timeout_secs(secs: Option<u64>) -> Self {
        Self {
            timeout: secs.map(Duration::from_secs),
            cancel: None,
        }
    }

    /// Drive `fut` to completion unless the timeout elapses or the token fires.
    ///
    /// Cancellation is checked first, so an already-cancelled token never
    /// polls the inner future.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        let bounded = async {
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, fut)
                    .await
                    .map_err(|_| Interrupted::TimedOut(limit)),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interrupted::Cancelled),
            out = bounded => out,
        }
    }
}
