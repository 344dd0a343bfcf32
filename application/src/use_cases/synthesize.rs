//! Synthesize use case
//!
//! Stand-alone synthesis over answers supplied by the caller, as opposed to
//! answers collected by a turn.

use crate::use_cases::aggregator::{Aggregator, SynthesisOutcome};
use chrono::{DateTime, Utc};
use superai_domain::{FinalAnswer, ProviderId, SynthesisRequest};
use thiserror::Error;

/// Errors rejected before the aggregator is called
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SynthesizeError {
    #[error("Message is required")]
    EmptyMessage,

    #[error("Responses array is required")]
    NoResponses,

    #[error("No usable response text to synthesize")]
    NothingUsable,
}

/// Result of a stand-alone synthesis
#[derive(Debug, Clone)]
pub struct SynthesisReport {
    pub answer: FinalAnswer,
    pub response_count: usize,
    pub model: String,
    pub processed_at: DateTime<Utc>,
}

impl SynthesisReport {
    pub fn succeeded(&self) -> bool {
        !self.answer.is_degraded()
    }
}

/// Use case for synthesizing caller-supplied answers
pub struct SynthesizeUseCase {
    aggregator: Aggregator,
}

impl SynthesizeUseCase {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn model(&self) -> &str {
        self.aggregator.model()
    }

    pub async fn execute(
        &self,
        message: &str,
        responses: Vec<(ProviderId, String)>,
    ) -> Result<SynthesisReport, SynthesizeError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SynthesizeError::EmptyMessage);
        }
        if responses.is_empty() {
            return Err(SynthesizeError::NoResponses);
        }

        let response_count = responses.len();
        let request = SynthesisRequest::new(message, responses);
        if request.is_empty() {
            return Err(SynthesizeError::NothingUsable);
        }

        let outcome: SynthesisOutcome = self.aggregator.run(&request).await;
        Ok(SynthesisReport {
            answer: outcome.into_final_answer(),
            response_count,
            model: self.aggregator.model().to_string(),
            processed_at: Utc::now(),
        })
    }
}
