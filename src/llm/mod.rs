//! LLM integration for the retention agent.
//!
//! Supports:
//! - **Anthropic**: Direct API access via rig-core
//! - **OpenAI**: Direct API access via rig-core
//!
//! Uses the rig-core crate for HTTP transport and the `RigAdapter` to bridge
//! rig's `CompletionModel` trait to our `LlmProvider` trait. Every provider
//! is wrapped in a `TimeoutProvider`.

pub mod provider;
mod rig_adapter;
pub mod timeout;

#[cfg(test)]
pub(crate) mod testing;

pub use provider::*;
pub use rig_adapter::RigAdapter;
pub use timeout::TimeoutProvider;

use std::sync::Arc;
use std::time::Duration;

use rig::client::CompletionClient;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{ConfigError, LlmError};

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    Anthropic,
    OpenAi,
}

impl LlmBackend {
    /// Environment variable holding this backend's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    /// Model used when `RETENTION_MODEL` is not set.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::InvalidValue {
                key: "RETENTION_LLM_BACKEND".to_string(),
                message: format!("unknown backend '{other}' (expected anthropic or openai)"),
            }),
        }
    }
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
    /// Deadline applied to every completion call.
    pub timeout: Duration,
}

impl LlmConfig {
    /// Build from `RETENTION_LLM_BACKEND`, the backend's API key variable,
    /// `RETENTION_MODEL` and `RETENTION_LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend: LlmBackend = std::env::var("RETENTION_LLM_BACKEND")
            .unwrap_or_else(|_| "anthropic".to_string())
            .parse()?;

        let api_key = std::env::var(backend.api_key_var())
            .map_err(|_| ConfigError::MissingEnvVar(backend.api_key_var().to_string()))?;

        let model = std::env::var("RETENTION_MODEL")
            .unwrap_or_else(|_| backend.default_model().to_string());

        let timeout_secs: u64 = std::env::var("RETENTION_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            backend,
            api_key: SecretString::from(api_key),
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Create an LLM provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let inner = match config.backend {
        LlmBackend::Anthropic => create_anthropic_provider(config)?,
        LlmBackend::OpenAi => create_openai_provider(config)?,
    };
    Ok(Arc::new(TimeoutProvider::new(inner, config.timeout)))
}

fn create_anthropic_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::anthropic;

    let client: rig::client::Client<anthropic::client::AnthropicExt> =
        anthropic::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: format!("Failed to create Anthropic client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using Anthropic (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, "anthropic", &config.model)))
}

fn create_openai_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, "openai", &config.model)))
}
