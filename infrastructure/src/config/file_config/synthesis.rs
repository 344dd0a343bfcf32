//! Synthesis configuration from TOML (`[synthesis]` section)

use super::providers::{KeyPolicy, ProviderKind, ProviderSettings};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use superai_application::SynthesisOptions;
use superai_domain::ProviderId;

/// Raw settings for the aggregator model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSynthesisConfig {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub site_url: String,
    pub site_name: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    /// Extra attempts after a rate-limited or unavailable upstream
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Cleaned synthesis shorter than this counts as too short
    pub min_usable_chars: usize,
}

impl Default for FileSynthesisConfig {
    fn default() -> Self {
        let options = SynthesisOptions::default();
        Self {
            kind: ProviderKind::OpenAi,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "deepseek/deepseek-r1-0528:free".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_key: None,
            site_url: "http://localhost:3000".to_string(),
            site_name: "SuperAI".to_string(),
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            timeout_seconds: options.timeout.as_secs(),
            max_retries: options.max_retries,
            retry_backoff_ms: options.retry_backoff.as_millis() as u64,
            min_usable_chars: options.min_usable_chars,
        }
    }
}

impl FileSynthesisConfig {
    /// Settings for the adapter that performs synthesis
    ///
    /// The aggregator always uses the server-side key.
    pub fn to_provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            id: ProviderId::Custom("synthesis".to_string()),
            kind: self.kind,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model.clone(),
            api_key_env: Some(self.api_key_env.clone()).filter(|v| !v.is_empty()),
            api_key: self.api_key.clone(),
            key_policy: KeyPolicy::Server,
            key_prefix: None,
            system_prompt: None,
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            top_p: Some(self.top_p),
            site_url: Some(self.site_url.clone()).filter(|v| !v.is_empty()),
            site_name: Some(self.site_name.clone()).filter(|v| !v.is_empty()),
            enabled: true,
        }
    }

    pub fn to_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.timeout_seconds),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            min_usable_chars: self.min_usable_chars,
        }
    }
}
