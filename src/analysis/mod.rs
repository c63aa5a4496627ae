// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! UX analysis of fetched page content
//!
//! Sends the page to a remote chat-completion model with a fixed prompt, then
//! parses and validates the answer against the [`AnalysisResult`] schema.
//! Any parse or schema failure fails the whole call.

pub mod client;
pub mod errors;
pub mod prompt;
pub mod schema;
pub mod types;

pub use client::{Analyzer, ChatCompletionClient, ModelAnalyzer, DEFAULT_BASE_URL};
pub use errors::AnalysisError;
pub use schema::{parse_and_validate, to_stored_text, SchemaError};
pub use types::{AnalysisResult, Issue, Severity};
