//! Error types for the retention agent.

use std::path::PathBuf;
use std::time::Duration;

/// Top-level error type for the agent.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Session error: {0}")]
    State(#[from] StateError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Bad or missing data supplied by the caller.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("No customers found in the uploaded data")]
    NoCustomers,

    #[error("Uploaded data is empty")]
    EmptyUpload,

    #[error("Invalid customer CSV at record {record}: {reason}")]
    InvalidCsv { record: u64, reason: String },

    #[error("Cannot read source document {path}: {source}")]
    UnreadableDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot extract text from {path}: {reason}")]
    UnextractableDocument { path: PathBuf, reason: String },

    #[error("Chunk store {path} failed: {reason}")]
    ChunkStore { path: PathBuf, reason: String },

    #[error("Message is empty")]
    EmptyMessage,
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether the same request may succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed { .. } | Self::RateLimited { .. } | Self::Timeout { .. }
        )
    }
}

/// Operation invoked in a session state that does not allow it.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("No customer has been seeded for this session")]
    NoCustomer,

    #[error("Conversation with {customer} has ended; advance to the next customer")]
    ConversationEnded { customer: String },

    #[error("Customer queue is empty")]
    NoCustomers,
}

/// Supervisor notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("E-mail delivery is not configured")]
    NotConfigured,

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to send e-mail: {0}")]
    SendFailed(String),
}

/// Result type alias for the agent.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_rate_limit_are_retryable() {
        let timeout = LlmError::Timeout {
            provider: "anthropic".into(),
            timeout: Duration::from_secs(5),
        };
        assert!(timeout.is_retryable());

        let limited = LlmError::RateLimited {
            provider: "openai".into(),
            retry_after: None,
        };
        assert!(limited.is_retryable());
    }

    #[test]
    fn auth_and_invalid_response_are_not_retryable() {
        assert!(!LlmError::AuthFailed { provider: "x".into() }.is_retryable());
        assert!(
            !LlmError::InvalidResponse {
                provider: "x".into(),
                reason: "empty".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn nested_errors_convert_into_top_level() {
        let err: Error = StateError::NoCustomer.into();
        assert!(matches!(err, Error::State(StateError::NoCustomer)));
        assert!(err.to_string().contains("No customer"));
    }
}
