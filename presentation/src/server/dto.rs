//! Request and response bodies of the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use superai_application::{SynthesisReport, TurnRecord};
use superai_domain::{AnswerSource, DegradedReason, ProviderId};

/// Body of `POST /api/{provider}`; `content` is accepted as an alias
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    pub prompt: Option<String>,
    pub content: Option<String>,
    pub api_key: Option<String>,
}

impl ProviderRequest {
    pub fn text(&self) -> &str {
        self.prompt
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderReply {
    pub result: String,
}

/// One answer handed to `POST /api/synthesize`
///
/// The text may arrive under any of `result`, `response`, `summary` or
/// `text`, checked in that order.
#[derive(Debug, Default, Deserialize)]
pub struct SynthesisItem {
    pub model: Option<String>,
    pub result: Option<String>,
    pub response: Option<String>,
    pub summary: Option<String>,
    pub text: Option<String>,
}

impl SynthesisItem {
    fn body(&self) -> String {
        [&self.result, &self.response, &self.summary, &self.text]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Normalize into the pair the synthesis use case works with
    pub fn into_pair(self, index: usize) -> (ProviderId, String) {
        let id = match self.model.as_deref().map(str::trim) {
            Some(model) if !model.is_empty() => ProviderId::from(model),
            _ => ProviderId::Custom(format!("response-{}", index + 1)),
        };
        let body = self.body();
        (id, body)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SynthesizeRequest {
    pub message: Option<String>,
    pub responses: Option<Vec<SynthesisItem>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeReply {
    pub success: bool,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub original_message: String,
    pub response_count: usize,
    pub processed_at: DateTime<Utc>,
    #[serde(rename = "model_used")]
    pub model_used: String,
}

impl SynthesizeReply {
    pub fn from_report(message: &str, report: SynthesisReport) -> Self {
        let success = report.succeeded();
        let error = match &report.answer.source {
            AnswerSource::Fallback { reason } => match reason {
                DegradedReason::Auth => Some("API configuration error"),
                DegradedReason::HighDemand => Some("Rate limit exceeded"),
                DegradedReason::TechnicalIssues => Some("Failed to generate summary"),
                DegradedReason::TooShort | DegradedReason::NoResponses => None,
            },
            _ => None,
        };
        Self {
            success,
            summary: success.then(|| report.answer.text.clone()),
            result: report.answer.text,
            error: error.map(str::to_string),
            original_message: message.to_string(),
            response_count: report.response_count,
            processed_at: report.processed_at,
            model_used: report.model,
        }
    }
}

/// Body of `POST /api/turns`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub prompt: Option<String>,
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub providers: Vec<String>,
    /// Per-provider keys, keyed by provider id
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationsQuery {
    pub user_id: Option<String>,
    /// Narrows the listing to one conversation
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConversationsReply {
    pub turns: Vec<TurnRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReply {
    pub status: &'static str,
    pub providers: Vec<ProviderId>,
    pub synthesis_model: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_request_aliases() {
        let req: ProviderRequest = serde_json::from_str(r#"{"content": "hi"}"#).unwrap();
        assert_eq!(req.text(), "hi");
        let req: ProviderRequest =
            serde_json::from_str(r#"{"prompt": "p", "content": "c", "apiKey": "k"}"#).unwrap();
        assert_eq!(req.text(), "p");
        assert_eq!(req.api_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_synthesis_item_field_order() {
        let item: SynthesisItem =
            serde_json::from_str(r#"{"model": "Claude", "summary": "s", "text": "t"}"#).unwrap();
        assert_eq!(item.into_pair(0), (ProviderId::Claude, "s".to_string()));

        let item: SynthesisItem =
            serde_json::from_str(r#"{"result": "", "response": "r"}"#).unwrap();
        assert_eq!(
            item.into_pair(2),
            (ProviderId::Custom("response-3".into()), "r".to_string())
        );
    }
}
