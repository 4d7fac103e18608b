//! Bridges rig's `CompletionModel` to our `LlmProvider` trait.

use async_trait::async_trait;
use rig::completion::{CompletionError, CompletionModel};
use rig::http_client::Error as HttpError;
use rig::message::{AssistantContent, Message};

use crate::error::LlmError;
use crate::llm::provider::{ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role};

/// Error-body fragments Anthropic and OpenAI use for rejected credentials.
const AUTH_MARKERS: &[&str] = &[
    "authentication_error",
    "permission_error",
    "invalid x-api-key",
    "invalid_api_key",
    "incorrect api key",
    "unauthorized",
];

/// Error-body fragments for throttled requests.
const RATE_LIMIT_MARKERS: &[&str] = &["rate_limit", "rate limit", "too many requests"];

/// Wraps any rig completion model.
pub struct RigAdapter<M> {
    model: M,
    provider: &'static str,
    model_name: String,
}

impl<M: CompletionModel> RigAdapter<M> {
    pub fn new(model: M, provider: &'static str, model_name: &str) -> Self {
        Self {
            model,
            provider,
            model_name: model_name.to_string(),
        }
    }
}

/// Split our message list into rig's preamble, history and final prompt.
fn split_messages(messages: Vec<ChatMessage>) -> (Option<String>, Vec<Message>, Option<Message>) {
    let mut preamble = Vec::new();
    let mut history = Vec::new();

    for message in messages {
        match message.role {
            Role::System => preamble.push(message.content),
            Role::User => history.push(Message::user(message.content)),
            Role::Assistant => history.push(Message::assistant(message.content)),
        }
    }

    let prompt = history.pop();
    let preamble = (!preamble.is_empty()).then(|| preamble.join("\n\n"));
    (preamble, history, prompt)
}

/// Map a rig failure onto our error kinds.
///
/// rig surfaces most non-2xx replies as `ProviderError(body)`, so the status
/// is only available for transport-level failures and the body is checked
/// for the providers' error codes.
fn classify_failure(provider: &str, error: CompletionError) -> LlmError {
    let status = match &error {
        CompletionError::HttpError(
            HttpError::InvalidStatusCode(status) | HttpError::InvalidStatusCodeWithMessage(status, _),
        ) => Some(status.as_u16()),
        _ => None,
    };
    if let CompletionError::JsonError(e) = error {
        return LlmError::Json(e);
    }

    let reason = error.to_string();
    let lower = reason.to_lowercase();
    let provider = provider.to_string();
    if matches!(status, Some(401 | 403)) || AUTH_MARKERS.iter().any(|m| lower.contains(m)) {
        LlmError::AuthFailed { provider }
    } else if status == Some(429) || RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m)) {
        LlmError::RateLimited {
            provider,
            retry_after: None,
        }
    } else {
        LlmError::RequestFailed { provider, reason }
    }
}

#[async_trait]
impl<M> LlmProvider for RigAdapter<M>
where
    M: CompletionModel + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (preamble, history, prompt) = split_messages(request.messages);
        let prompt = prompt.ok_or_else(|| LlmError::RequestFailed {
            provider: self.provider.to_string(),
            reason: "request has no user message".to_string(),
        })?;

        let mut builder = self.model.completion_request(prompt).messages(history);
        if let Some(preamble) = preamble {
            builder = builder.preamble(preamble);
        }
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(f64::from(temperature));
        }
        if let Some(max_tokens) = request.max_tokens {
            builder = builder.max_tokens(u64::from(max_tokens));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_failure(self.provider, e))?;

        let content = response
            .choice
            .iter()
            .filter_map(|part| match part {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        tracing::debug!(
            provider = self.provider,
            model = %self.model_name,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Completion finished"
        );

        Ok(CompletionResponse { content })
    }
}
