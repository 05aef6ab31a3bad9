//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::{AppConfig, ProviderKind};
use crate::common::errors::{PipelineError, Result};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with APP_, nested with `__`)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("APP")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| PipelineError::Configuration(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| PipelineError::Configuration(e.to_string()))
}

/// Load configuration from environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::default();

    if let Ok(kind) = std::env::var("BETSLIP_PROVIDER") {
        config.provider.kind = parse_provider_kind(&kind)?;
    }
    if let Ok(endpoint) = std::env::var("BETSLIP_PROVIDER_ENDPOINT") {
        config.provider.endpoint = endpoint;
    }
    config.provider.api_key = std::env::var("BETSLIP_PROVIDER_API_KEY").ok();
    config.provider.replay_path = std::env::var("BETSLIP_REPLAY_PATH").ok();

    if let Ok(url) = std::env::var("API_FOOTBALL_URL") {
        config.fixtures.base_url = url;
    }
    config.fixtures.api_key = std::env::var("API_FOOTBALL_KEY").ok();
    if let Ok(limit) = std::env::var("API_FOOTBALL_DAILY_LIMIT") {
        config.fixtures.daily_limit = limit
            .parse()
            .map_err(|e| PipelineError::Configuration(format!("API_FOOTBALL_DAILY_LIMIT: {}", e)))?;
    }

    if let Ok(url) = std::env::var("LIVESCORE_URL") {
        config.livescore.base_url = url;
    }

    Ok(config)
}

fn parse_provider_kind(value: &str) -> Result<ProviderKind> {
    match value.trim().to_lowercase().as_str() {
        "text_ocr" | "textract" | "ocr" => Ok(ProviderKind::TextOcr),
        "vision" | "gemini" => Ok(ProviderKind::Vision),
        "replay" => Ok(ProviderKind::Replay),
        other => Err(PipelineError::Configuration(format!(
            "unknown provider kind: {}",
            other
        ))),
    }
}
