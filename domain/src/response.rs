//! Provider responses and the shared error taxonomy
//!
//! Every adapter, whatever its wire format, reports back through
//! [`ProviderError`] so the rest of the pipeline never has to guess at
//! provider-specific failure shapes.

use crate::core::provider::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified failure of a provider or synthesis call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, invalid or rejected credential
    Auth,
    /// Provider asked us to slow down
    RateLimited,
    /// Account out of credits
    QuotaExceeded,
    /// Model or endpoint does not exist
    NotFound,
    /// 5xx, connect failure or timeout
    UpstreamUnavailable,
    /// 2xx body without the expected content field
    MalformedResponse,
    /// The request itself was rejected before or by the provider
    Validation,
}

impl ErrorKind {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => ErrorKind::Auth,
            402 => ErrorKind::QuotaExceeded,
            404 => ErrorKind::NotFound,
            429 => ErrorKind::RateLimited,
            400 | 413 | 422 => ErrorKind::Validation,
            _ => ErrorKind::UpstreamUnavailable,
        }
    }

    /// HTTP status used when this error crosses our own API boundary
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Auth => 401,
            ErrorKind::QuotaExceeded => 402,
            ErrorKind::NotFound => 404,
            ErrorKind::RateLimited => 429,
            ErrorKind::Validation => 400,
            ErrorKind::MalformedResponse => 502,
            ErrorKind::UpstreamUnavailable => 503,
        }
    }

    /// Whether retrying the same request later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::RateLimited | ErrorKind::UpstreamUnavailable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Auth => "auth",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Validation => "validation",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned by a provider adapter
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamUnavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, message)
    }

    /// Build an error from an HTTP status and the provider's error text
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_status(status), message)
    }

    /// An elapsed deadline is reported like any other unavailable upstream
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::upstream(format!("no response within {}s", after.as_secs()))
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Lifecycle of one provider's answer within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Pending,
    Succeeded,
    Failed,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Pending => "pending",
            ResponseStatus::Succeeded => "succeeded",
            ResponseStatus::Failed => "failed",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, ResponseStatus::Pending)
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single provider's response within one turn (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider: ProviderId,
    /// Raw provider output; empty unless succeeded
    pub raw_text: String,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ProviderResponse {
    /// Entry created when the request is dispatched
    pub fn pending(provider: ProviderId) -> Self {
        Self {
            provider,
            raw_text: String::new(),
            status: ResponseStatus::Pending,
            error_kind: None,
            error_message: None,
            completed_at: None,
        }
    }

    pub fn succeeded(provider: ProviderId, text: impl Into<String>) -> Self {
        Self {
            provider,
            raw_text: text.into(),
            status: ResponseStatus::Succeeded,
            error_kind: None,
            error_message: None,
            completed_at: Some(Utc::now()),
        }
    }

    pub fn failed(provider: ProviderId, error: &ProviderError) -> Self {
        Self {
            provider,
            raw_text: String::new(),
            status: ResponseStatus::Failed,
            error_kind: Some(error.kind),
            error_message: Some(error.message.clone()),
            completed_at: Some(Utc::now()),
        }
    }

    /// Build the settled entry for an adapter result
    pub fn from_result(provider: ProviderId, result: &Result<String, ProviderError>) -> Self {
        match result {
            Ok(text) => Self::succeeded(provider, text.clone()),
            Err(e) => Self::failed(provider, e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Succeeded
    }

    pub fn is_pending(&self) -> bool {
        self.status == ResponseStatus::Pending
    }

    /// Failed with an error that a retry might fix
    pub fn is_transient_failure(&self) -> bool {
        self.status == ResponseStatus::Failed && self.error_kind.is_some_and(|k| k.is_transient())
    }

    /// Failed with an error that no retry will fix
    pub fn is_permanent_failure(&self) -> bool {
        self.status == ResponseStatus::Failed && !self.is_transient_failure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(403), ErrorKind::Auth);
        assert_eq!(ErrorKind::from_status(402), ErrorKind::QuotaExceeded);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_status(422), ErrorKind::Validation);
        assert_eq!(ErrorKind::from_status(500), ErrorKind::UpstreamUnavailable);
        assert_eq!(ErrorKind::from_status(418), ErrorKind::UpstreamUnavailable);
    }

    #[test]
    fn test_outgoing_status_codes() {
        assert_eq!(ErrorKind::Auth.status_code(), 401);
        assert_eq!(ErrorKind::RateLimited.status_code(), 429);
        assert_eq!(ErrorKind::MalformedResponse.status_code(), 502);
        assert_eq!(ErrorKind::UpstreamUnavailable.status_code(), 503);
    }

    #[test]
    fn test_transient_kinds() {
        assert!(ErrorKind::RateLimited.is_transient());
        assert!(ErrorKind::UpstreamUnavailable.is_transient());
        assert!(!ErrorKind::Auth.is_transient());
        assert!(!ErrorKind::MalformedResponse.is_transient());
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::auth("API key is required");
        assert_eq!(err.to_string(), "auth: API key is required");
    }

    #[test]
    fn test_response_lifecycle() {
        let pending = ProviderResponse::pending(ProviderId::Gemini);
        assert!(pending.is_pending());
        assert!(pending.completed_at.is_none());

        let ok = ProviderResponse::from_result(ProviderId::Gemini, &Ok("hi".to_string()));
        assert!(ok.is_success());
        assert_eq!(ok.raw_text, "hi");
        assert!(ok.completed_at.is_some());

        let err = ProviderResponse::from_result(
            ProviderId::Gemini,
            &Err(ProviderError::new(ErrorKind::RateLimited, "slow down")),
        );
        assert!(err.is_transient_failure());
        assert!(!err.is_permanent_failure());
        assert_eq!(err.error_kind, Some(ErrorKind::RateLimited));
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::QuotaExceeded).unwrap();
        assert_eq!(json, "\"quota_exceeded\"");
    }
}
