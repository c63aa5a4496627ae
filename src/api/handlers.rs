// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use super::errors::ApiError;
use super::http_server::AppState;
use super::render::{render_page, PageView};
use crate::audit::SubmissionOutcome;
use crate::store::AuditRecord;

/// HTML form body for `POST /audit`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditForm {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub email: String,
}

/// JSON body for `POST /v1/audits`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRequest {
    pub url: String,
    pub email: String,
}

impl AuditRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_submission(&self.url, &self.email)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub email: String,
    pub count: usize,
    pub audits: Vec<AuditRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store: String,
}

/// Both fields are required; the url must be absolute http(s).
pub fn validate_submission(url: &str, email: &str) -> Result<(), ApiError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::ValidationError {
            field: "url".to_string(),
            message: "url is required".to_string(),
        });
    }
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => {
            return Err(ApiError::ValidationError {
                field: "url".to_string(),
                message: "url must be an absolute http or https address".to_string(),
            })
        }
    }

    let email = email.trim();
    if email.is_empty() {
        return Err(ApiError::ValidationError {
            field: "email".to_string(),
            message: "email is required".to_string(),
        });
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ApiError::ValidationError {
            field: "email".to_string(),
            message: "email must look like name@domain".to_string(),
        }),
    }
}

pub async fn index_handler() -> Html<String> {
    Html(render_page(&PageView::idle()))
}

pub async fn submit_form_handler(
    State(state): State<AppState>,
    Form(form): Form<AuditForm>,
) -> (StatusCode, Html<String>) {
    if let Err(e) = validate_submission(&form.url, &form.email) {
        let message = match &e {
            ApiError::ValidationError { message, .. } => message.clone(),
            other => other.to_string(),
        };
        let view = PageView::rejected(&form.url, &form.email, &message);
        return (StatusCode::BAD_REQUEST, Html(render_page(&view)));
    }

    let url = form.url.trim();
    let email = form.email.trim();
    let result = state.service.submit(url, email).await;
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::BAD_GATEWAY
    };

    (status, Html(render_page(&PageView::from_result(url, email, result))))
}

pub async fn create_audit_handler(
    State(state): State<AppState>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<SubmissionOutcome>, ApiError> {
    request.validate()?;

    let outcome = state
        .service
        .submit(request.url.trim(), request.email.trim())
        .await?;
    info!(
        "Audit {} served from {:?}",
        outcome.submission_id, outcome.source
    );
    Ok(Json(outcome))
}

pub async fn history_handler(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let email = query.email.trim();
    if email.is_empty() {
        return Err(ApiError::ValidationError {
            field: "email".to_string(),
            message: "email is required".to_string(),
        });
    }

    let audits = state.service.history(email).await.map_err(|e| {
        warn!("History lookup failed: {}", e);
        ApiError::InternalError("could not load audit history".to_string())
    })?;

    Ok(Json(HistoryResponse {
        email: email.to_string(),
        count: audits.len(),
        audits,
    }))
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version::VERSION_NUMBER.to_string(),
        store: state.service.store().backend_name().to_string(),
    })
}

pub async fn version_handler() -> Json<serde_json::Value> {
    Json(crate::version::get_version_info())
}
