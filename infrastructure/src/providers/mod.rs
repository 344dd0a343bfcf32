//! HTTP provider adapters
//!
//! One adapter per wire protocol; which protocol a provider speaks is a
//! configuration matter ([`ProviderKind`]).

pub mod anthropic;
pub mod credentials;
pub mod gemini;
pub mod http;
pub mod openai_compat;

use crate::config::{ConfigError, FileConfig, ProviderKind, ProviderSettings};
use anthropic::AnthropicAdapter;
use credentials::CredentialResolver;
use gemini::GeminiAdapter;
use openai_compat::OpenAiCompatAdapter;
use reqwest::Client;
use std::sync::Arc;
use superai_application::{ProviderAdapter, ProviderRegistry};
use tracing::{debug, info};

/// Builds adapters from configuration, sharing one HTTP client
pub struct ProviderFactory {
    client: Client,
}

impl ProviderFactory {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Adapter for one resolved provider
    pub fn adapter(&self, settings: ProviderSettings) -> Arc<dyn ProviderAdapter> {
        let credentials = CredentialResolver::from_settings(&settings);
        debug!(
            provider = %settings.id,
            kind = settings.kind.as_str(),
            model = %settings.model,
            server_key = credentials.has_server_key(),
            "Building provider adapter"
        );
        let client = self.client.clone();
        match settings.kind {
            ProviderKind::OpenAi => Arc::new(OpenAiCompatAdapter::new(client, settings, credentials)),
            ProviderKind::Anthropic => Arc::new(AnthropicAdapter::new(client, settings, credentials)),
            ProviderKind::Gemini => Arc::new(GeminiAdapter::new(client, settings, credentials)),
        }
    }

    /// Registry of every enabled provider, in dispatch order
    pub fn registry(&self, config: &FileConfig) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for settings in config.enabled_providers() {
            registry.register(self.adapter(settings));
        }
        info!(providers = ?registry, "Provider registry ready");
        registry
    }

    /// Adapter the aggregator sends synthesis prompts to
    pub fn synthesis_adapter(&self, config: &FileConfig) -> Arc<dyn ProviderAdapter> {
        self.adapter(config.synthesis.to_provider_settings())
    }
}
