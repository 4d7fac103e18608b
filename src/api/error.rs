//! Maps crate errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{Error, LlmError};

#[derive(Debug)]
pub enum ApiError {
    /// Unknown session id (404).
    SessionNotFound(String),
    /// Malformed request that never reached the controller (400).
    BadRequest(String),
    Agent(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Agent(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Agent(err) => match err {
                Error::Input(_) => StatusCode::BAD_REQUEST,
                Error::State(_) => StatusCode::CONFLICT,
                Error::Llm(LlmError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
                Error::Llm(LlmError::RateLimited { .. }) => StatusCode::SERVICE_UNAVAILABLE,
                Error::Llm(_) => StatusCode::BAD_GATEWAY,
                Error::Config(_) | Error::Notify(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Agent(Error::Llm(e)) if e.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let retryable = self.retryable();
        let message = match &self {
            Self::SessionNotFound(id) => format!("Session {id} not found"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Agent(err) => err.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "Request rejected");
        }

        (
            status,
            Json(serde_json::json!({
                "error": message,
                "retryable": retryable,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InputError, StateError};
    use std::time::Duration;

    #[test]
    fn error_kinds_map_to_statuses() {
        let cases = [
            (ApiError::from(Error::from(InputError::EmptyUpload)), 400),
            (ApiError::from(Error::from(StateError::NoCustomers)), 409),
            (
                ApiError::from(Error::from(LlmError::Timeout {
                    provider: "x".into(),
                    timeout: Duration::from_secs(1),
                })),
                504,
            ),
            (
                ApiError::from(Error::from(LlmError::AuthFailed {
                    provider: "x".into(),
                })),
                502,
            ),
            (
                ApiError::from(Error::from(LlmError::RateLimited {
                    provider: "x".into(),
                    retry_after: None,
                })),
                503,
            ),
            (ApiError::SessionNotFound("abc".into()), 404),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err:?}");
        }
    }

    #[test]
    fn rejected_credentials_are_not_retryable() {
        let auth = ApiError::from(Error::from(LlmError::AuthFailed {
            provider: "anthropic".into(),
        }));
        assert!(!auth.retryable());

        let timeout = ApiError::from(Error::from(LlmError::Timeout {
            provider: "anthropic".into(),
            timeout: Duration::from_secs(1),
        }));
        assert!(timeout.retryable());
        assert!(!ApiError::SessionNotFound("abc".into()).retryable());
    }
}
