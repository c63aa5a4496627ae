// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Chat-completion client for UX analysis via an OpenAI-compatible API

use async_trait::async_trait;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::errors::AnalysisError;
use super::prompt::{user_prompt, ANALYSIS_MODEL, ANALYSIS_TEMPERATURE, SYSTEM_PROMPT};
use super::schema::parse_and_validate;
use super::types::AnalysisResult;
use crate::call_options::CallOptions;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

// --- OpenAI-compatible serde structs ---

#[derive(Debug, serde::Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(serde::Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(serde::Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(serde::Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Produces a validated analysis from raw page content
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(
        &self,
        content: &str,
        options: &CallOptions,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionClient {
    /// Create a client. A missing API key is only reported when a call is made.
    pub fn new(base_url: &str, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        let base_url = base_url.trim_end_matches('/').to_string();
        info!(
            "Analysis client configured: endpoint={}, model={}",
            base_url, ANALYSIS_MODEL
        );

        Ok(Self {
            client,
            base_url,
            api_key,
            model: ANALYSIS_MODEL.to_string(),
        })
    }

    /// Override the model identifier
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub(crate) fn build_request(&self, content: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            temperature: ANALYSIS_TEMPERATURE,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(content),
                },
            ],
        }
    }

    /// Send one completion request and return the first choice's text
    pub async fn complete(
        &self,
        content: &str,
        options: &CallOptions,
    ) -> Result<String, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AnalysisError::RemoteCall("no API key configured for the model provider".to_string())
        })?;

        let request = self.build_request(content);
        let start = Instant::now();

        // One bound covers send, status check and body read
        let call = async {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| AnalysisError::RemoteCall(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!("Model provider returned {}: {}", status, body);
                return Err(AnalysisError::RemoteCall(format!(
                    "{} {}",
                    status.as_u16(),
                    body
                )));
            }

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
            Ok::<ChatResponse, AnalysisError>(chat_response)
        };

        let chat_response = options
            .run(call)
            .await
            .map_err(|interrupted| AnalysisError::RemoteCall(interrupted.to_string()))??;

        debug!(
            "Completion received from {} in {}ms",
            self.model,
            start.elapsed().as_millis()
        );

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AnalysisError::MalformedResponse("completion has no message content".to_string())
            })
    }
}

/// Analyzer that asks the remote model and validates its answer
pub struct ModelAnalyzer {
    client: ChatCompletionClient,
}

impl ModelAnalyzer {
    pub fn new(client: ChatCompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Analyzer for ModelAnalyzer {
    async fn analyze(
        &self,
        content: &str,
        options: &CallOptions,
    ) -> Result<AnalysisResult, AnalysisError> {
        let raw = self.client.complete(content, options).await?;
        let analysis = parse_and_validate(&raw)?;

        info!(
            "Analysis validated: {} issues, {} recommendations",
            analysis.issues.len(),
            analysis.recommendations.len()
        );
        Ok(analysis)
    }
}
