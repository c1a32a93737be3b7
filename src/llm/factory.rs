//! Generation client factory.
//!
//! Centralizes provider-specific logic for creating clients and generators.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::LlmConfig;
use crate::error::{RelayError, Result};
use crate::llm::{GeminiClient, GeminiConfig, LlmClient, LlmProvider, MockLlmClient, SqlGenerator};

/// Creates a client for the given provider.
///
/// Gemini requires a key; `config.api_key()` is consulted, which already
/// reflects `GEMINI_API_KEY` once environment overrides are applied.
pub fn create_client(provider: LlmProvider, config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::Gemini => {
            let key = config.api_key().ok_or_else(|| {
                RelayError::config("No API key configured. Set GEMINI_API_KEY.")
            })?;
            Ok(Box::new(GeminiClient::new(GeminiConfig::from_llm_config(
                config, key,
            ))?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

/// Creates the SQL generator for the configured provider.
///
/// A Gemini provider without a key yields a degraded generator rather than
/// an error.
pub fn create_generator(config: &LlmConfig) -> Result<SqlGenerator> {
    let provider: LlmProvider = config.provider.parse().map_err(RelayError::config)?;

    if provider == LlmProvider::Gemini && config.api_key().is_none() {
        warn!("No GEMINI_API_KEY found; /generate-sql will return placeholder SQL");
        return Ok(SqlGenerator::degraded(&config.model));
    }

    let client: Arc<dyn LlmClient> = create_client(provider, config)?.into();
    info!("Using {} provider with model {}", provider, config.model);
    Ok(SqlGenerator::new(client, &config.model))
}
