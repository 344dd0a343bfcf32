//! Application layer for superai
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{SynthesisOptions, TurnParams};
pub use ports::{
    history::{HistoryError, HistoryReader, HistoryWriter, NoHistory, ResponseRecord, TurnRecord},
    progress::{NoProgress, TurnObserver},
    provider::{CompletionRequest, Credential, ProviderAdapter, ProviderRegistry},
};
pub use use_cases::aggregator::{Aggregator, SynthesisOutcome};
pub use use_cases::ask_provider::{AskProviderError, AskProviderUseCase};
pub use use_cases::chat_session::ChatSession;
pub use use_cases::run_turn::{
    RunTurnError, RunTurnInput, RunTurnUseCase, SharedTurn, TurnOutcome,
};
pub use use_cases::synthesize::{SynthesisReport, SynthesizeError, SynthesizeUseCase};
