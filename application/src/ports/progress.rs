//! Turn progress port
//!
//! Defines the interface for reporting progress while a turn runs.

use superai_domain::{FinalAnswer, ProviderId, ProviderResponse, TurnId};

/// Callback for progress updates during a turn
///
/// Implementations live in the presentation layer and can display progress
/// in various ways (terminal spinners, logs, etc.). Each provider completion
/// is reported as soon as it arrives, independently of its siblings.
pub trait TurnObserver: Send + Sync {
    /// Called once the prompt has been sent to every provider
    fn on_dispatch(&self, turn_id: TurnId, providers: &[ProviderId]);

    /// Called when a single provider finishes; `cleaned` is the display text
    fn on_provider_complete(&self, response: &ProviderResponse, cleaned: &str);

    /// Called when the trigger fires and the aggregator is invoked
    fn on_synthesis_start(&self, _responses: usize) {}

    /// Called when the turn's final answer is set
    fn on_final_answer(&self, _answer: &FinalAnswer) {}
}

/// No-op observer for when progress reporting is not needed
pub struct NoProgress;

impl TurnObserver for NoProgress {
    fn on_dispatch(&self, _turn_id: TurnId, _providers: &[ProviderId]) {}
    fn on_provider_complete(&self, _response: &ProviderResponse, _cleaned: &str) {}
}
