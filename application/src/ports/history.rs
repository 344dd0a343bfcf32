//! History ports
//!
//! Every finished turn is handed to a [`HistoryWriter`] exactly once.
//! [`HistoryReader`] serves the per-user conversation list, optionally
//! narrowed to one conversation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use superai_domain::{
    AnswerSource, ConversationTurn, ErrorKind, ResponseStatus, TurnId,
};
use thiserror::Error;

/// Errors from the history store
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("History is disabled")]
    Disabled,
}

/// One provider's output as stored in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub provider_name: String,
    /// Raw text on success, the error message on failure
    pub output: String,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

/// Persisted shape of a finished turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    pub turn_id: TurnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub prompt: String,
    pub responses: Vec<ResponseRecord>,
    pub final_answer: String,
    pub degraded: bool,
    pub answer_source: AnswerSource,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl TurnRecord {
    /// Build the record for a turn; `None` until the turn has a final answer
    pub fn from_turn(
        turn: &ConversationTurn,
        user_id: Option<String>,
        conversation_id: Option<String>,
    ) -> Option<Self> {
        let answer = turn.final_answer()?;
        let responses = turn
            .responses()
            .iter()
            .map(|r| ResponseRecord {
                provider_name: r.provider.display_name().to_string(),
                output: if r.is_success() {
                    r.raw_text.clone()
                } else {
                    r.error_message.clone().unwrap_or_default()
                },
                status: r.status,
                error_kind: r.error_kind,
            })
            .collect();

        Some(Self {
            turn_id: turn.id(),
            user_id,
            conversation_id,
            prompt: turn.question().content().to_string(),
            responses,
            final_answer: answer.text.clone(),
            degraded: answer.is_degraded(),
            answer_source: answer.source.clone(),
            created_at: turn.created_at(),
            completed_at: turn.completed_at().unwrap_or_else(Utc::now),
        })
    }

    /// Whether this record belongs to the user and, when given, the conversation
    pub fn matches(&self, user_id: &str, conversation_id: Option<&str>) -> bool {
        self.user_id.as_deref() == Some(user_id)
            && conversation_id.is_none_or(|c| self.conversation_id.as_deref() == Some(c))
    }
}

/// Port for persisting finished turns
#[async_trait]
pub trait HistoryWriter: Send + Sync {
    async fn persist_turn(&self, record: &TurnRecord) -> Result<(), HistoryError>;
}

/// Port for reading a user's past turns, newest first
#[async_trait]
pub trait HistoryReader: Send + Sync {
    /// Turns of `user_id`; only those of `conversation_id` when one is given
    async fn list_turns(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
    ) -> Result<Vec<TurnRecord>, HistoryError>;
}

/// No-op store for tests and when history is disabled
pub struct NoHistory;

#[async_trait]
impl HistoryWriter for NoHistory {
    async fn persist_turn(&self, _record: &TurnRecord) -> Result<(), HistoryError> {
        Ok(())
    }
}

#[async_trait]
impl HistoryReader for NoHistory {
    async fn list_turns(
        &self,
        _user_id: &str,
        _conversation_id: Option<&str>,
    ) -> Result<Vec<TurnRecord>, HistoryError> {
        Err(HistoryError::Disabled)
    }
}
