//! Conversation turn entity

use super::answer::FinalAnswer;
use crate::aggregation::collector::{ResponseCollector, Snapshot};
use crate::aggregation::fallback::fallback_answer;
use crate::aggregation::policy::TriggerPolicy;
use crate::aggregation::trigger::{TriggerState, TriggerTransition};
use crate::cleaning::ResponseCleaner;
use crate::core::error::DomainError;
use crate::core::provider::ProviderId;
use crate::core::question::Question;
use crate::prompt::SynthesisRequest;
use crate::response::{ProviderError, ProviderResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TurnId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle of a turn
///
/// ```text
/// Collecting ──fire──▶ Synthesizing ──▶ Complete | Degraded
///      └────────suppress / settle──────────────▶ Degraded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnState {
    #[default]
    Collecting,
    Synthesizing,
    Complete,
    Degraded,
}

impl TurnState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnState::Collecting => "collecting",
            TurnState::Synthesizing => "synthesizing",
            TurnState::Complete => "complete",
            TurnState::Degraded => "degraded",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Complete | TurnState::Degraded)
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One prompt submission and everything that came back for it (Entity)
///
/// The final answer is set at most once. A turn is sealed after it has been
/// handed to history; from then on every mutation is rejected.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    id: TurnId,
    question: Question,
    collector: ResponseCollector,
    final_answer: Option<FinalAnswer>,
    state: TurnState,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    sealed: bool,
}

impl ConversationTurn {
    pub fn new(question: Question, policy: TriggerPolicy) -> Self {
        Self::with_id(TurnId::new(), question, policy)
    }

    pub fn with_id(id: TurnId, question: Question, policy: TriggerPolicy) -> Self {
        Self {
            id,
            question,
            collector: ResponseCollector::new(policy),
            final_answer: None,
            state: TurnState::Collecting,
            created_at: Utc::now(),
            completed_at: None,
            sealed: false,
        }
    }

    pub fn id(&self) -> TurnId {
        self.id
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn final_answer(&self) -> Option<&FinalAnswer> {
        self.final_answer.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn responses(&self) -> &[ProviderResponse] {
        self.collector.responses()
    }

    pub fn response(&self, provider: &ProviderId) -> Option<&ProviderResponse> {
        self.collector.get(provider)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.collector.snapshot()
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.collector.trigger_state()
    }

    /// Every dispatched provider has answered or failed
    pub fn all_settled(&self) -> bool {
        self.collector.is_settled()
    }

    /// Cleaned display text of a provider's response, if it succeeded
    pub fn cleaned_text(&self, provider: &ProviderId) -> Option<String> {
        self.collector
            .get(provider)
            .filter(|r| r.is_success())
            .map(|r| ResponseCleaner::clean(&r.raw_text))
    }

    pub fn dispatch(&mut self, provider: ProviderId) -> Result<(), DomainError> {
        self.ensure_open()?;
        self.collector.dispatch(provider);
        Ok(())
    }

    /// Record a provider completion; moves to `Synthesizing` when it fires
    pub fn record(
        &mut self,
        provider: ProviderId,
        result: &Result<String, ProviderError>,
    ) -> Result<TriggerTransition, DomainError> {
        self.ensure_open()?;
        let transition = self.collector.record(provider, result);
        self.apply(transition);
        Ok(transition)
    }

    /// Mark everything still pending as failed and force a trigger decision
    pub fn settle(&mut self) -> Result<TriggerTransition, DomainError> {
        self.ensure_open()?;
        let transition = self.collector.settle();
        self.apply(transition);
        Ok(transition)
    }

    /// Request for the synthesis call, from the responses as they are now
    pub fn synthesis_request(&self) -> SynthesisRequest {
        SynthesisRequest::from_snapshot(self.question.content(), &self.collector.snapshot())
    }

    /// Degraded answer from the best individual response
    pub fn fallback_answer(&self) -> FinalAnswer {
        fallback_answer(self.collector.responses())
    }

    /// Set the final answer; allowed exactly once
    pub fn finish(&mut self, answer: FinalAnswer) -> Result<(), DomainError> {
        self.ensure_open()?;
        if self.final_answer.is_some() {
            return Err(DomainError::AnswerAlreadySet(self.id.to_string()));
        }
        self.state = if answer.is_degraded() {
            TurnState::Degraded
        } else {
            TurnState::Complete
        };
        self.final_answer = Some(answer);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Freeze the turn once it has a final answer
    pub fn seal(&mut self) -> Result<(), DomainError> {
        if self.final_answer.is_none() {
            return Err(DomainError::InvalidTransition(format!(
                "turn {} cannot be sealed without a final answer",
                self.id
            )));
        }
        self.sealed = true;
        Ok(())
    }

    fn apply(&mut self, transition: TriggerTransition) {
        if transition == TriggerTransition::Fired && self.state == TurnState::Collecting {
            self.state = TurnState::Synthesizing;
        }
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if self.sealed {
            Err(DomainError::TurnSealed(self.id.to_string()))
        } else {
            Ok(())
        }
    }
}
