// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from environment variables
//!
//! The store location is required at startup. The model provider key is not:
//! a missing key only surfaces when an analysis is attempted.

use std::env;
use thiserror::Error;

use crate::analysis::client::DEFAULT_BASE_URL;
use crate::analysis::prompt::ANALYSIS_MODEL;
use crate::store::{RestStoreConfig, StoreBackend};

/// 24 hours
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Load `.env` into the process environment, then return the log filter.
/// Must run before the subscriber is installed so `RUST_LOG` from `.env` applies.
pub fn load_env_and_log_filter() -> String {
    dotenv::dotenv().ok();
    log_filter(|key| env::var(key).ok())
}

/// `RUST_LOG` when set, otherwise [`DEFAULT_LOG_FILTER`]
pub fn log_filter<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup("RUST_LOG")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Model provider settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Provider API key (OPENAI_API_KEY)
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// Model identifier; AUDIT_MODEL overrides the fixed gpt-4
    pub model: String,
    /// Timeout for the completion call (None = no limit)
    pub timeout_secs: Option<u64>,
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub model: ModelConfig,
    /// How long a stored audit is served from cache
    pub cache_ttl_secs: u64,
    /// Timeout for page fetches (None = no limit)
    pub fetch_timeout_secs: Option<u64>,
    /// HTTP listen address for the web surface
    pub listen_addr: String,
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend = get("AUDIT_STORE_BACKEND").unwrap_or_else(|| "rest".to_string());
        let store = match backend.to_lowercase().as_str() {
            "memory" => StoreBackend::Memory,
            "rest" => {
                let base_url = get("AUDIT_STORE_URL").ok_or(ConfigError::Missing("AUDIT_STORE_URL"))?;
                let api_key = get("AUDIT_STORE_KEY").ok_or(ConfigError::Missing("AUDIT_STORE_KEY"))?;
                let mut rest = RestStoreConfig::new(&base_url, &api_key);
                if let Some(table) = get("AUDIT_STORE_TABLE") {
                    rest.table = table;
                }
                rest.timeout_secs = parse_optional(&get, "AUDIT_STORE_TIMEOUT_SECS")?;
                StoreBackend::Rest(rest)
            }
            other => {
                return Err(ConfigError::Invalid {
                    key: "AUDIT_STORE_BACKEND",
                    reason: format!("unknown backend '{}', expected rest or memory", other),
                })
            }
        };

        let model = ModelConfig {
            api_key: get("OPENAI_API_KEY"),
            base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: get("AUDIT_MODEL").unwrap_or_else(|| ANALYSIS_MODEL.to_string()),
            timeout_secs: parse_optional(&get, "MODEL_TIMEOUT_SECS")?,
        };

        let config = Self {
            store,
            model,
            cache_ttl_secs: parse_optional(&get, "AUDIT_CACHE_TTL_SECS")?
                .unwrap_or(DEFAULT_CACHE_TTL_SECS),
            fetch_timeout_secs: parse_optional(&get, "FETCH_TIMEOUT_SECS")?,
            listen_addr: get("API_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        };

        config.validate().map_err(|reason| ConfigError::Invalid {
            key: "config",
            reason,
        })?;
        Ok(config)
    }

    /// Cache TTL as a duration; fails when the seconds do not fit one
    pub fn cache_ttl(&self) -> Result<chrono::Duration, String> {
        i64::try_from(self.cache_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| format!("cache TTL of {}s is out of range", self.cache_ttl_secs))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_ttl_secs == 0 {
            return Err("cache TTL must be greater than 0".to_string());
        }
        self.cache_ttl()?;
        if self.fetch_timeout_secs == Some(0) || self.model.timeout_secs == Some(0) {
            return Err("timeouts must be at least 1 second when set".to_string());
        }
        if let StoreBackend::Rest(rest) = &self.store {
            url::Url::parse(&rest.base_url)
                .map_err(|e| format!("AUDIT_STORE_URL is not a valid URL: {}", e))?;
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!("invalid listen address '{}'", self.listen_addr));
        }
        Ok(())
    }

    /// Human-readable store backend name
    pub fn store_backend_name(&self) -> &'static str {
        match self.store {
            StoreBackend::Memory => "memory",
            StoreBackend::Rest(_) => "rest",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreBackend::Memory,
            model: ModelConfig {
                api_key: None,
                base_url: DEFAULT_BASE_URL.to_string(),
                model: ANALYSIS_MODEL.to_string(),
                timeout_secs: None,
            },
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            fetch_timeout_secs: None,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

fn parse_optional<G>(get: &G, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
    }
}
