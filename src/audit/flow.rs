// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Submission state machine
//!
//! ```text
//! Idle → Checking ─┬→ CacheHit ──────────────────────────→ Done
//!                  └→ Fetching → Analyzing → Persisting ─→ Done
//! (any non-terminal phase after Idle) ──────────────────→ Error
//! ```
//!
//! Pure bookkeeping: no I/O happens here. [`super::service::AuditService`]
//! drives a [`Submission`] through these phases.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Idle,
    Checking,
    CacheHit,
    Fetching,
    Analyzing,
    Persisting,
    Done,
    Error,
}

impl SubmissionPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_advance_to(self, next: SubmissionPhase) -> bool {
        use SubmissionPhase::*;
        matches!(
            (self, next),
            (Idle, Checking)
                | (Checking, CacheHit)
                | (Checking, Fetching)
                | (CacheHit, Done)
                | (Fetching, Analyzing)
                | (Analyzing, Persisting)
                | (Persisting, Done)
                | (Checking | CacheHit | Fetching | Analyzing | Persisting, Error)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SubmissionPhase::Done | SubmissionPhase::Error)
    }
}

/// Where a presented analysis came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Cache,
    Fresh,
}

/// Source of the current time, swappable so cache age can be tested exactly
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One user submission and the phases it has passed through
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: Uuid,
    pub url: String,
    pub email: String,
    phase: SubmissionPhase,
    trail: Vec<SubmissionPhase>,
}

impl Submission {
    pub fn new(url: &str, email: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.to_string(),
            email: email.to_string(),
            phase: SubmissionPhase::Idle,
            trail: vec![SubmissionPhase::Idle],
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Every phase entered so far, starting with `Idle`
    pub fn trail(&self) -> &[SubmissionPhase] {
        &self.trail
    }

    pub(crate) fn advance(&mut self, next: SubmissionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.phase,
            next
        );
        debug!(submission = %self.id, "{:?} -> {:?}", self.phase, next);
        self.phase = next;
        self.trail.push(next);
    }
}
