//! Google Gemini `generateContent` adapter

use super::credentials::CredentialResolver;
use super::http::{classify_transport, read_json, require_text};
use crate::config::ProviderSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use superai_application::{CompletionRequest, ProviderAdapter};
use superai_domain::{ProviderError, ProviderId};
use tracing::debug;

pub struct GeminiAdapter {
    client: Client,
    settings: ProviderSettings,
    credentials: CredentialResolver,
}

impl GeminiAdapter {
    pub fn new(client: Client, settings: ProviderSettings, credentials: CredentialResolver) -> Self {
        Self {
            client,
            settings,
            credentials,
        }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn provider(&self) -> &ProviderId {
        &self.settings.id
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let key = self.credentials.resolve(request.credential.as_ref())?;
        let label = self.settings.id.display_name();

        let system = request
            .system
            .as_deref()
            .or(self.settings.system_prompt.as_deref());
        let body = GenerateBody {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: request.temperature.or(self.settings.temperature),
                top_p: request.top_p.or(self.settings.top_p),
                max_output_tokens: request.max_tokens.or(self.settings.max_tokens),
            },
        };

        debug!(provider = %self.settings.id, model = %self.settings.model, "Generating content");

        let url = format!(
            "{}/models/{}:generateContent",
            self.settings.base_url, self.settings.model
        );
        let response = self
            .client
            .post(url)
            .query(&[("key", key.expose())])
            .json(&body)
            .send()
            .await
            .map_err(|e| classify_transport(label, &e))?;
        let parsed: GenerateResponse = read_json(label, response).await?;

        let text = parsed.candidates.into_iter().next().map(|candidate| {
            candidate
                .content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        });
        require_text(label, text)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
