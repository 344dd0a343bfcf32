//! Shared HTTP plumbing for provider adapters

use crate::config::ConfigError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use superai_domain::{ErrorKind, ProviderError};
use tracing::debug;

/// Build the client shared by every adapter
///
/// Request deadlines are applied by the use cases, so only connecting is
/// bounded here.
pub fn build_client() -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("superai/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Map a transport failure (no HTTP status) onto the taxonomy
pub fn classify_transport(provider: &str, error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::upstream(format!("{} request timed out", provider))
    } else if error.is_connect() {
        ProviderError::upstream(format!("Could not reach {}", provider))
    } else if error.is_decode() {
        ProviderError::malformed(format!("Unreadable response from {}", provider))
    } else {
        ProviderError::upstream(format!("{} request failed: {}", provider, error))
    }
}

/// Map a non-success status and its body onto the taxonomy
///
/// Uses the provider's own `error.message` when the body carries one.
pub fn classify_status(provider: &str, status: u16, body: &str) -> ProviderError {
    let kind = ErrorKind::from_status(status);
    let upstream_message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("error"))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .filter(|m| !m.trim().is_empty());

    let message = match (kind, upstream_message) {
        (ErrorKind::Auth, _) => {
            format!("Invalid API key. Please check your {} API key.", provider)
        }
        (ErrorKind::RateLimited, _) => "Rate limit exceeded. Please try again later.".to_string(),
        (ErrorKind::QuotaExceeded, _) => {
            format!("Insufficient quota. Please check your {} account.", provider)
        }
        (_, Some(message)) => message,
        (_, None) => format!("{} returned status {}", provider, status),
    };
    ProviderError::new(kind, message)
}

/// Read a response: classify errors, then decode the JSON body
pub async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| classify_transport(provider, &e))?;

    if !status.is_success() {
        debug!(provider, status = status.as_u16(), "Provider returned an error status");
        return Err(classify_status(provider, status.as_u16(), &body));
    }

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::malformed(format!("Unexpected response from {}: {}", provider, e))
    })
}

/// Reject a missing or blank content field
pub fn require_text(provider: &str, text: Option<String>) -> Result<String, ProviderError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ProviderError::malformed(format!(
            "No response content received from {}",
            provider
        ))),
    }
}
