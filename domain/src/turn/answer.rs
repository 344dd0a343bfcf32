//! Final answer of a turn

use crate::core::provider::ProviderId;
use crate::response::ErrorKind;
use serde::{Deserialize, Serialize};

pub const TOO_SHORT_MESSAGE: &str =
    "I couldn't generate a comprehensive summary. Please try again with your request.";
pub const AUTH_MESSAGE: &str =
    "I'm having technical difficulties with the API configuration. Please try again later.";
pub const HIGH_DEMAND_MESSAGE: &str =
    "I'm currently experiencing high demand. Please try again in a few moments.";
pub const TECHNICAL_ISSUES_MESSAGE: &str =
    "I'm experiencing technical issues. Please try again shortly.";
pub const NO_RESPONSES_MESSAGE: &str =
    "None of the AI providers returned a usable response. Please try again.";

/// Why a turn ended without a synthesized answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// Synthesis output was below the usable length after cleaning
    TooShort,
    /// Synthesis provider rejected our credentials
    Auth,
    /// Synthesis provider was rate limited or out of quota
    HighDemand,
    /// Any other synthesis failure
    TechnicalIssues,
    /// No provider produced usable text
    NoResponses,
}

impl DegradedReason {
    /// Map a failed synthesis call to the message shown to the user
    pub fn from_error_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Auth => DegradedReason::Auth,
            ErrorKind::RateLimited | ErrorKind::QuotaExceeded => DegradedReason::HighDemand,
            _ => DegradedReason::TechnicalIssues,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            DegradedReason::TooShort => TOO_SHORT_MESSAGE,
            DegradedReason::Auth => AUTH_MESSAGE,
            DegradedReason::HighDemand => HIGH_DEMAND_MESSAGE,
            DegradedReason::TechnicalIssues => TECHNICAL_ISSUES_MESSAGE,
            DegradedReason::NoResponses => NO_RESPONSES_MESSAGE,
        }
    }
}

/// Where a final answer came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerSource {
    Synthesized { model: String },
    Provider { provider: ProviderId },
    Fallback { reason: DegradedReason },
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::Synthesized { .. } => "synthesized",
            AnswerSource::Provider { .. } => "provider",
            AnswerSource::Fallback { .. } => "fallback",
        }
    }
}

/// The user-visible answer of a turn (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub text: String,
    pub source: AnswerSource,
}

impl FinalAnswer {
    pub fn synthesized(text: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AnswerSource::Synthesized {
                model: model.into(),
            },
        }
    }

    /// Degraded answer taken from one provider's cleaned response
    pub fn from_provider(provider: ProviderId, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: AnswerSource::Provider { provider },
        }
    }

    /// Degraded answer carrying an explanatory message
    pub fn fallback(reason: DegradedReason) -> Self {
        Self {
            text: reason.message().to_string(),
            source: AnswerSource::Fallback { reason },
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self.source, AnswerSource::Synthesized { .. })
    }
}
