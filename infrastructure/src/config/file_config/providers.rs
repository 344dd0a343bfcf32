//! Provider configuration from TOML (`[providers.<id>]` sections)
//!
//! Every field is optional: a section only overrides what it names, and the
//! rest comes from [`ProviderSettings::builtin`] for the six built-in
//! providers. Custom provider ids must spell out `kind`, `base_url` and
//! `model` themselves.

use serde::{Deserialize, Serialize};
use superai_domain::ProviderId;

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Wire protocol spoken by a provider endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// `POST {base}/chat/completions` (OpenAI, OpenRouter, Hugging Face router)
    #[serde(alias = "openai_compat", alias = "openrouter")]
    OpenAi,
    /// `POST {base}/messages`
    Anthropic,
    /// `POST {base}/models/{model}:generateContent`
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
        }
    }
}

/// Where an adapter takes its API key from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyPolicy {
    /// Only the key configured on the server
    Server,
    /// Only a key supplied with the request
    Request,
    /// A request key when present, the server key otherwise
    #[default]
    Either,
}

/// Raw `[providers.<id>]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    pub kind: Option<ProviderKind>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// Environment variable holding the server-side key
    pub api_key_env: Option<String>,
    /// Inline key (prefer `api_key_env`)
    pub api_key: Option<String>,
    pub key_policy: Option<KeyPolicy>,
    /// Required key prefix, e.g. `sk-ant-`
    pub key_prefix: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    /// Sent as `HTTP-Referer` to OpenRouter
    pub site_url: Option<String>,
    /// Sent as `X-Title` to OpenRouter
    pub site_name: Option<String>,
    pub enabled: Option<bool>,
}

/// Fully resolved settings for one provider adapter
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub id: ProviderId,
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    pub key_policy: KeyPolicy,
    pub key_prefix: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub site_url: Option<String>,
    pub site_name: Option<String>,
    pub enabled: bool,
}

impl ProviderSettings {
    fn new(id: ProviderId, kind: ProviderKind, base_url: &str, model: &str) -> Self {
        Self {
            id,
            kind,
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key_env: None,
            api_key: None,
            key_policy: KeyPolicy::Either,
            key_prefix: None,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            site_url: None,
            site_name: None,
            enabled: true,
        }
    }

    fn openrouter(id: ProviderId, model: &str) -> Self {
        let mut settings = Self::new(id, ProviderKind::OpenAi, OPENROUTER_URL, model);
        settings.api_key_env = Some("OPENROUTER_API_KEY".to_string());
        settings.key_prefix = Some("sk-or-".to_string());
        settings.site_url = Some("http://localhost:3000".to_string());
        settings.site_name = Some("SuperAI".to_string());
        settings
    }

    /// Defaults for a built-in provider; `None` for custom ids
    pub fn builtin(id: &ProviderId) -> Option<Self> {
        let settings = match id {
            ProviderId::Gpt => {
                let mut s = Self::new(
                    id.clone(),
                    ProviderKind::OpenAi,
                    "https://api.openai.com/v1",
                    "gpt-4o-mini",
                );
                s.api_key_env = Some("OPENAI_API_KEY".to_string());
                s.temperature = Some(0.9);
                s.top_p = Some(0.9);
                s.max_tokens = Some(256);
                s
            }
            ProviderId::Claude => {
                let mut s = Self::new(
                    id.clone(),
                    ProviderKind::Anthropic,
                    "https://api.anthropic.com/v1",
                    "claude-3-sonnet-20240229",
                );
                s.api_key_env = Some("ANTHROPIC_API_KEY".to_string());
                s.key_policy = KeyPolicy::Request;
                s.key_prefix = Some("sk-ant-".to_string());
                s.max_tokens = Some(1024);
                s
            }
            ProviderId::Gemini => {
                let mut s = Self::new(
                    id.clone(),
                    ProviderKind::Gemini,
                    "https://generativelanguage.googleapis.com/v1beta",
                    "gemini-1.5-flash",
                );
                s.api_key_env = Some("GEMINI_API_KEY".to_string());
                s.key_policy = KeyPolicy::Server;
                s
            }
            ProviderId::DeepSeek => {
                let mut s = Self::new(
                    id.clone(),
                    ProviderKind::OpenAi,
                    "https://router.huggingface.co/v1",
                    "deepseek-ai/DeepSeek-R1",
                );
                s.api_key_env = Some("HF_TOKEN".to_string());
                s.key_policy = KeyPolicy::Server;
                s.system_prompt = Some(
                    "You are a helpful assistant. Provide direct, clear responses without \
                     showing your reasoning process or internal thoughts."
                        .to_string(),
                );
                s.max_tokens = Some(500);
                s.temperature = Some(0.7);
                s.top_p = Some(0.9);
                s
            }
            ProviderId::Llama => {
                let mut s = Self::openrouter(id.clone(), "meta-llama/llama-3.3-8b-instruct:free");
                s.key_policy = KeyPolicy::Server;
                s
            }
            ProviderId::Devstral => {
                let mut s = Self::openrouter(id.clone(), "mistralai/devstral-small:free");
                s.key_policy = KeyPolicy::Server;
                s.system_prompt = Some(
                    "You are a helpful assistant. Provide responses in markdown format when \
                     appropriate. Use proper markdown syntax for headers, lists, code blocks, \
                     links, and other formatting to make your responses well-structured and \
                     readable."
                        .to_string(),
                );
                s.max_tokens = Some(1000);
                s.temperature = Some(0.7);
                s.top_p = Some(1.0);
                s
            }
            ProviderId::Custom(_) => return None,
        };
        Some(settings)
    }
}

impl FileProviderConfig {
    /// Overlay this section on the built-in defaults for `id`
    ///
    /// Returns `None` for a custom id that lacks `kind`, `base_url` or `model`.
    pub fn resolve(&self, id: &ProviderId) -> Option<ProviderSettings> {
        let mut settings = match ProviderSettings::builtin(id) {
            Some(base) => base,
            None => ProviderSettings::new(
                id.clone(),
                self.kind?,
                self.base_url.as_deref()?,
                self.model.as_deref()?,
            ),
        };

        if let Some(kind) = self.kind {
            settings.kind = kind;
        }
        if let Some(url) = &self.base_url {
            settings.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if self.api_key_env.is_some() {
            settings.api_key_env = self.api_key_env.clone();
        }
        if self.api_key.is_some() {
            settings.api_key = self.api_key.clone();
        }
        if let Some(policy) = self.key_policy {
            settings.key_policy = policy;
        }
        if self.key_prefix.is_some() {
            settings.key_prefix = self.key_prefix.clone().filter(|p| !p.is_empty());
        }
        if self.system_prompt.is_some() {
            settings.system_prompt = self.system_prompt.clone().filter(|p| !p.is_empty());
        }
        if self.temperature.is_some() {
            settings.temperature = self.temperature;
        }
        if self.max_tokens.is_some() {
            settings.max_tokens = self.max_tokens;
        }
        if self.top_p.is_some() {
            settings.top_p = self.top_p;
        }
        if self.site_url.is_some() {
            settings.site_url = self.site_url.clone();
        }
        if self.site_name.is_some() {
            settings.site_name = self.site_name.clone();
        }
        if let Some(enabled) = self.enabled {
            settings.enabled = enabled;
        }
        Some(settings)
    }
}
