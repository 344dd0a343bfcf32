//! Domain layer for superai
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Turn
//!
//! A user prompt is fanned out to several providers. Each answer is recorded
//! into the turn's [`ResponseCollector`]; after every record the
//! [`SynthesisTrigger`] decides whether enough answers are in to ask the
//! aggregator for one combined answer.
//!
//! ## Degraded completion
//!
//! When synthesis is suppressed or fails, the turn still ends with a
//! [`FinalAnswer`]: either the best individual response or an explanatory
//! message.

pub mod aggregation;
pub mod cleaning;
pub mod core;
pub mod prompt;
pub mod response;
pub mod turn;
pub mod util;

// Re-export commonly used types
pub use aggregation::{
    ResponseCollector, Snapshot, SynthesisTrigger, TriggerDecision, TriggerPolicy, TriggerState,
    TriggerTransition, fallback_answer, select_fallback,
};
pub use cleaning::ResponseCleaner;
pub use core::{error::DomainError, provider::ProviderId, question::Question};
pub use prompt::{PromptTemplate, SynthesisPrompt, SynthesisRequest};
pub use response::{ErrorKind, ProviderError, ProviderResponse, ResponseStatus};
pub use turn::{AnswerSource, ConversationTurn, DegradedReason, FinalAnswer, TurnId, TurnState};
