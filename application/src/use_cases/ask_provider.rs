//! Ask Provider use case
//!
//! Sends one prompt to one provider and returns its cleaned answer. Backs the
//! per-provider HTTP endpoints.

use crate::ports::provider::{Credential, ProviderRegistry};
use std::time::Duration;
use superai_domain::{DomainError, ProviderError, ProviderId, Question, ResponseCleaner};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from a single-provider call
#[derive(Error, Debug)]
pub enum AskProviderError {
    #[error(transparent)]
    InvalidPrompt(#[from] DomainError),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Use case for calling one provider directly
pub struct AskProviderUseCase {
    registry: ProviderRegistry,
    timeout: Duration,
}

impl AskProviderUseCase {
    pub fn new(registry: ProviderRegistry, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub async fn execute(
        &self,
        provider: &ProviderId,
        prompt: &str,
        credential: Option<Credential>,
    ) -> Result<String, AskProviderError> {
        let question = Question::new(prompt)?;
        let adapter = self
            .registry
            .get(provider)
            .ok_or_else(|| AskProviderError::UnknownProvider(provider.to_string()))?;

        info!(provider = %provider, model = adapter.model(), "Calling provider");
        let raw = match tokio::time::timeout(
            self.timeout,
            adapter.call(question.content(), credential),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(self.timeout)),
        }
        .inspect_err(|e| warn!(provider = %provider, "Provider call failed: {}", e))?;

        Ok(ResponseCleaner::clean(&raw))
    }
}
