// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_audit_handler, health_handler, history_handler, index_handler, submit_form_handler,
    version_handler,
};
use crate::audit::AuditService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AuditService>,
}

impl AppState {
    pub fn new(service: AuditService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // HTML form
        .route("/", get(index_handler))
        .route("/audit", post(submit_form_handler))
        // JSON API
        .route("/v1/audits", post(create_audit_handler).get(history_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until ctrl-c
pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Audit server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}
