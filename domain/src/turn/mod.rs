//! Conversation turns
//!
//! A turn is one prompt submission: its per-provider responses, the trigger
//! deciding on synthesis, and the final answer the user ends up seeing.

pub mod answer;
pub mod entities;

pub use answer::{AnswerSource, DegradedReason, FinalAnswer};
pub use entities::{ConversationTurn, TurnId, TurnState};
