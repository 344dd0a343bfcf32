//! Anthropic Messages API adapter

use super::credentials::CredentialResolver;
use super::http::{classify_transport, read_json, require_text};
use crate::config::ProviderSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use superai_application::{CompletionRequest, ProviderAdapter};
use superai_domain::{ProviderError, ProviderId};
use tracing::debug;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicAdapter {
    client: Client,
    settings: ProviderSettings,
    credentials: CredentialResolver,
}

impl AnthropicAdapter {
    pub fn new(client: Client, settings: ProviderSettings, credentials: CredentialResolver) -> Self {
        Self {
            client,
            settings,
            credentials,
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> &ProviderId {
        &self.settings.id
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let key = self.credentials.resolve(request.credential.as_ref())?;
        let label = self.settings.id.display_name();

        let body = MessagesBody {
            model: &self.settings.model,
            max_tokens: request
                .max_tokens
                .or(self.settings.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            system: request
                .system
                .as_deref()
                .or(self.settings.system_prompt.as_deref()),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature.or(self.settings.temperature),
            top_p: request.top_p.or(self.settings.top_p),
        };

        debug!(provider = %self.settings.id, model = %self.settings.model, "Sending message");

        let response = self
            .client
            .post(format!("{}/messages", self.settings.base_url))
            .header("x-api-key", key.expose())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(label, &e))?;
        let parsed: MessagesResponse = read_json(label, response).await?;

        let text = parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text);
        require_text(label, text)
    }
}

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}
