// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod audit;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Website UX audit CLI
#[derive(Parser, Debug)]
#[command(name = "ux-audit-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Run and inspect website UX audits", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a website, reusing a recent audit when one exists
    Analyze(audit::AnalyzeArgs),

    /// List stored audits for an email address
    History(audit::HistoryArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Analyze(args) => audit::analyze(args).await,
        Commands::History(args) => audit::history(args).await,
    }
}
