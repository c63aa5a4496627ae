// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use tracing::error;

use crate::analysis::{AnalysisResult, Severity};
use crate::api::validate_submission;
use crate::audit::{build_service, AuditError, AuditService, ResultSource, SubmissionOutcome};
use crate::config::AppConfig;

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Website to audit (absolute http/https URL)
    #[arg(long)]
    pub url: String,

    /// Email the audit is stored under
    #[arg(long)]
    pub email: String,

    /// Print the full outcome as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Email to list audits for
    #[arg(long)]
    pub email: String,

    /// Print records as JSON
    #[arg(long)]
    pub json: bool,
}

fn load_service() -> Result<AuditService> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    config.validate().map_err(|e| anyhow!(e))?;
    build_service(&config)
}

/// Submit with the same trimmed (url, email) key the web surface uses
pub async fn submit_trimmed(
    service: &AuditService,
    url: &str,
    email: &str,
) -> Result<SubmissionOutcome, AuditError> {
    service.submit(url.trim(), email.trim()).await
}

pub async fn analyze(args: AnalyzeArgs) -> Result<()> {
    validate_submission(&args.url, &args.email).map_err(|e| anyhow!("{}", e))?;
    let service = load_service()?;

    println!("🔍 Analyzing {}...", args.url.trim());
    let outcome = match submit_trimmed(&service, &args.url, &args.email).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Submission failed: {}", e);
            return Err(anyhow!(e.user_message()));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome.source {
        ResultSource::Cache => println!("✅ Retrieved recent analysis!"),
        ResultSource::Fresh => println!("✅ Analysis complete!"),
    }
    print!("{}", format_analysis(&outcome.analysis));
    Ok(())
}

pub async fn history(args: HistoryArgs) -> Result<()> {
    let service = load_service()?;
    let records = service
        .history(args.email.trim())
        .await
        .map_err(|e| anyhow!("Could not load history: {}", e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!("No audits stored for {}", args.email);
        return Ok(());
    }

    println!("📋 {} audit(s) for {}:", records.len(), args.email);
    for record in &records {
        println!(
            "  {}  {}",
            record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            record.url
        );
    }
    Ok(())
}

/// Plain-text rendering for the terminal
pub fn format_analysis(analysis: &AnalysisResult) -> String {
    let mut out = String::new();

    out.push_str("\nSummary\n");
    out.push_str(&format!("  {}\n", analysis.overview));

    out.push_str(&format!(
        "\nIssues ({} critical, {} major, {} minor)\n",
        analysis.count_by_severity(Severity::Critical),
        analysis.count_by_severity(Severity::Major),
        analysis.count_by_severity(Severity::Minor)
    ));
    for issue in &analysis.issues {
        out.push_str(&format!("  - {}: {}\n", issue.severity, issue.description));
        out.push_str(&format!("    Recommendation: {}\n", issue.recommendation));
    }

    out.push_str("\nRecommendations\n");
    for recommendation in &analysis.recommendations {
        out.push_str(&format!("  - {}\n", recommendation));
    }

    out
}
