//! Synthesis request value objects

use crate::aggregation::collector::Snapshot;
use crate::cleaning::ResponseCleaner;
use crate::core::provider::ProviderId;

/// Input to one synthesis attempt, built fresh from a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub question: String,
    /// Cleaned, non-empty texts in dispatch order
    pub responses: Vec<(ProviderId, String)>,
}

impl SynthesisRequest {
    /// Clean every entry and drop the ones that end up empty
    pub fn new(
        question: impl Into<String>,
        entries: impl IntoIterator<Item = (ProviderId, String)>,
    ) -> Self {
        let responses = entries
            .into_iter()
            .map(|(id, raw)| (id, ResponseCleaner::clean(&raw)))
            .filter(|(_, text)| !text.is_empty())
            .collect();
        Self {
            question: question.into(),
            responses,
        }
    }

    pub fn from_snapshot(question: impl Into<String>, snapshot: &Snapshot) -> Self {
        Self::new(question, snapshot.successes.iter().cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }
}

/// The two prompts sent to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisPrompt {
    pub system: String,
    pub user: String,
}
