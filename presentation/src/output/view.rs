//! Serializable view of a turn
//!
//! Shared by the `/api/turns` endpoint and `--output json`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use superai_application::TurnOutcome;
use superai_domain::{AnswerSource, ConversationTurn, ErrorKind, ProviderResponse, ResponseStatus};

/// One provider's result as shown to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderView {
    pub provider: String,
    pub name: String,
    pub status: ResponseStatus,
    /// Cleaned text on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl From<&ProviderResponse> for ProviderView {
    fn from(response: &ProviderResponse) -> Self {
        Self {
            provider: response.provider.as_str().to_string(),
            name: response.provider.display_name().to_string(),
            status: response.status,
            result: response
                .is_success()
                .then(|| superai_domain::ResponseCleaner::clean(&response.raw_text)),
            error: response.error_message.clone(),
            error_kind: response.error_kind,
        }
    }
}

/// A turn as shown to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnView {
    pub turn_id: String,
    pub prompt: String,
    pub state: String,
    pub responses: Vec<ProviderView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer_source: Option<AnswerSource>,
    pub degraded: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

impl TurnView {
    pub fn from_turn(turn: &ConversationTurn) -> Self {
        let answer = turn.final_answer();
        Self {
            turn_id: turn.id().to_string(),
            prompt: turn.question().content().to_string(),
            state: turn.state().to_string(),
            responses: turn.responses().iter().map(ProviderView::from).collect(),
            final_answer: answer.map(|a| a.text.clone()),
            answer_source: answer.map(|a| a.source.clone()),
            degraded: answer.is_some_and(|a| a.is_degraded()),
            created_at: turn.created_at(),
            completed_at: turn.completed_at(),
            persist_error: None,
        }
    }

    pub fn from_outcome(outcome: &TurnOutcome) -> Self {
        let mut view = Self::from_turn(&outcome.turn);
        view.persist_error = outcome.persist_error.clone();
        view
    }
}
