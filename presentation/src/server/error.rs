//! API error type and its HTTP mapping

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use superai_application::{AskProviderError, HistoryError, RunTurnError, SynthesizeError};
use superai_domain::ProviderError;
use thiserror::Error;
use tracing::warn;

/// Errors returned by API handlers, rendered as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unavailable(String),

    #[error(transparent)]
    Provider(ProviderError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Provider(e) => StatusCode::from_u16(e.kind.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Provider(e) => e.message.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), "API error: {}", self);
        }
        (status, Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) | JsonRejection::JsonSyntaxError(_) => {
                ApiError::BadRequest("Invalid JSON format in request body".to_string())
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<AskProviderError> for ApiError {
    fn from(error: AskProviderError) -> Self {
        match error {
            AskProviderError::InvalidPrompt(e) => ApiError::BadRequest(e.to_string()),
            AskProviderError::UnknownProvider(p) => {
                ApiError::NotFound(format!("Unknown provider: {}", p))
            }
            AskProviderError::Provider(e) => ApiError::Provider(e),
        }
    }
}

impl From<RunTurnError> for ApiError {
    fn from(error: RunTurnError) -> Self {
        match error {
            RunTurnError::NoProviders => ApiError::Unavailable(error.to_string()),
            RunTurnError::UnknownProvider(_) => ApiError::BadRequest(error.to_string()),
            RunTurnError::Superseded(_) => ApiError::Conflict(error.to_string()),
            RunTurnError::Domain(e) if e.is_validation() => ApiError::BadRequest(e.to_string()),
            RunTurnError::Domain(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<SynthesizeError> for ApiError {
    fn from(error: SynthesizeError) -> Self {
        match error {
            SynthesizeError::EmptyMessage | SynthesizeError::NoResponses => ApiError::BadRequest(
                "Missing required fields: message and responses array".to_string(),
            ),
            SynthesizeError::NothingUsable => ApiError::BadRequest(error.to_string()),
        }
    }
}

impl From<HistoryError> for ApiError {
    fn from(error: HistoryError) -> Self {
        match error {
            HistoryError::Disabled => ApiError::Unavailable(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use superai_domain::ErrorKind;

    #[test]
    fn test_provider_error_keeps_kind_status() {
        let err = ApiError::Provider(ProviderError::new(ErrorKind::RateLimited, "slow down"));
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message(), "slow down");

        let err = ApiError::Provider(ProviderError::auth("API key is required"));
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_superseded_is_conflict() {
        let err: ApiError = RunTurnError::Superseded(superai_domain::TurnId::new()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
