//! Provider adapter port
//!
//! Defines the interface for calling an external LLM provider. Adapters live
//! in the infrastructure layer; each one maps its own wire format and status
//! codes onto [`ProviderError`].

use async_trait::async_trait;
use std::sync::Arc;
use superai_domain::{ProviderError, ProviderId};

/// An API key supplied with a request or resolved from configuration
///
/// The `Debug` output never contains the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key; blank keys are treated as absent
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// One completion call
///
/// Unset sampling options fall back to the adapter's configured defaults.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub credential: Option<Credential>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_credential(mut self, credential: Option<Credential>) -> Self {
        self.credential = credential;
        self
    }
}

/// Adapter for one external LLM provider
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter talks to
    fn provider(&self) -> &ProviderId;

    /// Upstream model name sent with each request
    fn model(&self) -> &str;

    /// Run a completion and return the provider's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;

    /// Send a bare prompt with the adapter's default options
    async fn call(
        &self,
        prompt: &str,
        credential: Option<Credential>,
    ) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(prompt).with_credential(credential);
        self.complete(&request).await
    }
}

/// The set of adapters a turn can dispatch to, in dispatch order
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: Vec<Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an adapter, replacing any earlier one for the same provider
    pub fn register(&mut self, adapter: Arc<dyn ProviderAdapter>) {
        match self
            .adapters
            .iter_mut()
            .find(|a| a.provider() == adapter.provider())
        {
            Some(existing) => *existing = adapter,
            None => self.adapters.push(adapter),
        }
    }

    pub fn with(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, provider: &ProviderId) -> Option<Arc<dyn ProviderAdapter>> {
        self.adapters
            .iter()
            .find(|a| a.provider() == provider)
            .cloned()
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        self.adapters.iter().map(|a| a.provider().clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ProviderAdapter>> {
        self.adapters.iter()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ids()).finish()
    }
}
