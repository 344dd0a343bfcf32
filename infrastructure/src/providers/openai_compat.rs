//! OpenAI-compatible chat completions adapter
//!
//! Serves OpenAI itself, OpenRouter and the Hugging Face inference router,
//! which all accept `POST {base_url}/chat/completions`.

use super::credentials::CredentialResolver;
use super::http::{classify_transport, read_json, require_text};
use crate::config::ProviderSettings;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use superai_application::{CompletionRequest, ProviderAdapter};
use superai_domain::{ProviderError, ProviderId};
use tracing::debug;

pub struct OpenAiCompatAdapter {
    client: Client,
    settings: ProviderSettings,
    credentials: CredentialResolver,
}

impl OpenAiCompatAdapter {
    pub fn new(client: Client, settings: ProviderSettings, credentials: CredentialResolver) -> Self {
        Self {
            client,
            settings,
            credentials,
        }
    }

    fn label(&self) -> &str {
        if self.settings.base_url.contains("openrouter.ai") {
            "OpenRouter"
        } else {
            self.settings.id.display_name()
        }
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionBody<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request
            .system
            .as_deref()
            .or(self.settings.system_prompt.as_deref())
        {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatCompletionBody {
            model: &self.settings.model,
            messages,
            temperature: request.temperature.or(self.settings.temperature),
            max_tokens: request.max_tokens.or(self.settings.max_tokens),
            top_p: request.top_p.or(self.settings.top_p),
        }
    }
}

impl std::fmt::Debug for OpenAiCompatAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatAdapter")
            .field("provider", &self.settings.id)
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish()
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiCompatAdapter {
    fn provider(&self) -> &ProviderId {
        &self.settings.id
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let key = self.credentials.resolve(request.credential.as_ref())?;
        let url = format!("{}/chat/completions", self.settings.base_url);
        let body = self.body(request);

        debug!(
            provider = %self.settings.id,
            model = %self.settings.model,
            messages = body.messages.len(),
            "Sending chat completion"
        );

        let mut builder = self.client.post(&url).bearer_auth(key.expose()).json(&body);
        if let Some(site_url) = &self.settings.site_url {
            builder = builder.header("HTTP-Referer", site_url);
        }
        if let Some(site_name) = &self.settings.site_name {
            builder = builder.header("X-Title", site_name);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_transport(self.label(), &e))?;
        let parsed: ChatCompletionResponse = read_json(self.label(), response).await?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);
        require_text(self.label(), text)
    }
}

// ── Wire types ──

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeyPolicy, ProviderKind};
    use serde_json::json;
    use superai_application::Credential;
    use superai_domain::ErrorKind;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, policy: KeyPolicy, server_key: Option<&str>) -> OpenAiCompatAdapter {
        let mut settings = ProviderSettings::builtin(&ProviderId::Devstral).unwrap();
        settings.base_url = server.uri();
        settings.kind = ProviderKind::OpenAi;
        let credentials = CredentialResolver::new(
            "Devstral",
            policy,
            server_key.and_then(Credential::new),
            Some("sk-or-".to_string()),
        );
        OpenAiCompatAdapter::new(Client::new(), settings, credentials)
    }

    #[tokio::test]
    async fn test_success_sends_headers_and_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-or-server"))
            .and(header("x-title", "SuperAI"))
            .and(header("http-referer", "http://localhost:3000"))
            .and(body_partial_json(json!({
                "model": "mistralai/devstral-small:free",
                "max_tokens": 1000
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hi there"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, KeyPolicy::Server, Some("sk-or-server"));
        let text = adapter.call("hello", None).await.unwrap();
        assert_eq!(text, "Hi there");
    }

    #[tokio::test]
    async fn test_request_overrides_sampling() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({"temperature": 0.3, "max_tokens": 2000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, KeyPolicy::Server, Some("sk-or-server"));
        let request = CompletionRequest::new("q")
            .with_temperature(0.3)
            .with_max_tokens(2000);
        assert_eq!(adapter.complete(&request).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"message": "no credits"}
            })))
            .mount(&server)
            .await;

        let adapter = adapter(&server, KeyPolicy::Server, Some("sk-or-server"));
        let err = adapter.call("hello", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::QuotaExceeded);
        assert_eq!(
            err.message,
            "Insufficient quota. Please check your Devstral account."
        );
    }

    #[tokio::test]
    async fn test_missing_content_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let adapter = adapter(&server, KeyPolicy::Server, Some("sk-or-server"));
        let err = adapter.call("hello", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_key_checked_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = adapter(&server, KeyPolicy::Either, None);
        let err = adapter
            .call("hello", Credential::new("sk-ant-wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = adapter.call("hello", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Auth);
    }

    #[tokio::test]
    async fn test_unreachable_is_upstream_unavailable() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let mut settings = ProviderSettings::builtin(&ProviderId::Gpt).unwrap();
        settings.base_url = uri;
        let adapter = OpenAiCompatAdapter::new(
            Client::new(),
            settings,
            CredentialResolver::new("GPT", KeyPolicy::Either, Credential::new("k"), None),
        );
        let err = adapter.call("hello", None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UpstreamUnavailable);
    }
}
