// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTML presentation of submission state
//!
//! Maps a [`PageView`] to markup and nothing else. All text coming from the
//! user or the model is escaped.

use ammonia::clean_text;

use crate::analysis::AnalysisResult;
use crate::audit::{AuditError, ResultSource, SubmissionOutcome};

pub const NOTICE_CACHED: &str = "Retrieved recent analysis!";
pub const NOTICE_FRESH: &str = "Analysis complete!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Transient notification shown above the results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Everything the page needs to draw itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageView {
    pub url: String,
    pub email: String,
    pub notice: Option<Notice>,
    pub analysis: Option<AnalysisResult>,
}

impl PageView {
    /// Empty form
    pub fn idle() -> Self {
        Self::default()
    }

    /// Form re-filled with the submitted values plus an error notice
    pub fn rejected(url: &str, email: &str, message: &str) -> Self {
        Self {
            url: url.to_string(),
            email: email.to_string(),
            notice: Some(Notice {
                kind: NoticeKind::Error,
                text: message.to_string(),
            }),
            analysis: None,
        }
    }

    /// View after a submission finished, successfully or not
    pub fn from_result(
        url: &str,
        email: &str,
        result: Result<SubmissionOutcome, AuditError>,
    ) -> Self {
        match result {
            Ok(outcome) => Self {
                url: url.to_string(),
                email: email.to_string(),
                notice: Some(Notice {
                    kind: NoticeKind::Success,
                    text: match outcome.source {
                        ResultSource::Cache => NOTICE_CACHED.to_string(),
                        ResultSource::Fresh => NOTICE_FRESH.to_string(),
                    },
                }),
                analysis: Some(outcome.analysis),
            },
            Err(e) => Self::rejected(url, email, e.user_message()),
        }
    }
}

pub fn render_page(view: &PageView) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Website UX Analyzer</title>\n</head>\n<body>\n<main>\n\
         <h1>Website UX Analyzer</h1>\n<p>Get instant UX feedback for any website</p>\n",
    );

    if let Some(notice) = &view.notice {
        let class = match notice.kind {
            NoticeKind::Success => "notice success",
            NoticeKind::Error => "notice error",
        };
        html.push_str(&format!(
            "<div class=\"{}\" role=\"status\">{}</div>\n",
            class,
            clean_text(&notice.text)
        ));
    }

    html.push_str(&format!(
        "<form method=\"post\" action=\"/audit\">\n\
         <input type=\"url\" name=\"url\" required placeholder=\"Enter website URL\" value=\"{}\">\n\
         <input type=\"email\" name=\"email\" required placeholder=\"Your email\" value=\"{}\">\n\
         <button type=\"submit\">Analyze Website</button>\n</form>\n",
        clean_text(&view.url),
        clean_text(&view.email)
    ));

    if let Some(analysis) = &view.analysis {
        html.push_str(&render_analysis(analysis));
    }

    html.push_str("</main>\n</body>\n</html>\n");
    html
}

/// Results panel: overview, issue list, recommendation list
pub fn render_analysis(analysis: &AnalysisResult) -> String {
    let mut html = String::from("<section class=\"results\">\n");

    html.push_str(&format!(
        "<h2>Summary</h2>\n<p class=\"overview\">{}</p>\n",
        clean_text(&analysis.overview)
    ));

    html.push_str("<h2>Issues</h2>\n<ul class=\"issues\">\n");
    for issue in &analysis.issues {
        html.push_str(&format!(
            "<li><strong>{}: </strong>{}<br><span class=\"recommendation\">Recommendation: {}</span></li>\n",
            issue.severity,
            clean_text(&issue.description),
            clean_text(&issue.recommendation)
        ));
    }
    html.push_str("</ul>\n");

    html.push_str("<h2>Recommendations</h2>\n<ul class=\"recommendations\">\n");
    for recommendation in &analysis.recommendations {
        html.push_str(&format!("<li>{}</li>\n", clean_text(recommendation)));
    }
    html.push_str("</ul>\n</section>\n");

    html
}
