// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod render;

pub use errors::{ApiError, ErrorResponse};
pub use handlers::{
    validate_submission, AuditForm, AuditRequest, HealthResponse, HistoryQuery, HistoryResponse,
};
pub use http_server::{create_app, start_server, AppState};
pub use render::{render_analysis, render_page, Notice, NoticeKind, PageView};
