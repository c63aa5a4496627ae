// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use fabstir_ux_audit::{
    api::{start_server, AppState},
    audit::build_service,
    config::{self, AppConfig},
    version,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env first, so RUST_LOG from it reaches the subscriber
    let filter = config::load_env_and_log_filter();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    println!("🚀 Starting {}", version::get_version_string());

    // Missing store credentials are fatal here, before anything is served
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    println!("🗄️  Store backend: {}", config.store_backend_name());
    if config.model.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; every fresh analysis will fail");
    }

    let service = build_service(&config)?;
    let state = AppState::new(service);

    println!("🌐 Serving on http://{}", config.listen_addr);
    start_server(state, &config.listen_addr)
        .await
        .map_err(|e| anyhow!("server stopped: {}", e))?;

    println!("👋 Shut down cleanly");
    Ok(())
}
