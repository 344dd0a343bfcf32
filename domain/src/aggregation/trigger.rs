//! Synthesis trigger state machine

use super::policy::{TriggerDecision, TriggerPolicy};
use crate::response::ProviderResponse;
use serde::{Deserialize, Serialize};

/// Where the trigger is for the current turn
///
/// `Fired` and `Suppressed` are terminal: once either is reached no later
/// response can move the trigger again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerState {
    #[default]
    Waiting,
    Fired,
    Suppressed,
}

impl TriggerState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TriggerState::Waiting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerState::Waiting => "waiting",
            TriggerState::Fired => "fired",
            TriggerState::Suppressed => "suppressed",
        }
    }
}

impl std::fmt::Display for TriggerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of feeding a new observation into the trigger
///
/// Only the observation that actually moves the state reports `Fired` or
/// `Suppressed`; every later one reports `Unchanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTransition {
    Unchanged,
    Fired,
    Suppressed,
}

/// Fires synthesis at most once per turn
#[derive(Debug, Clone, Default)]
pub struct SynthesisTrigger {
    policy: TriggerPolicy,
    state: TriggerState,
}

impl SynthesisTrigger {
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            policy,
            state: TriggerState::Waiting,
        }
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Re-evaluate the policy after a response changed
    pub fn observe(&mut self, responses: &[ProviderResponse]) -> TriggerTransition {
        if self.state.is_terminal() {
            return TriggerTransition::Unchanged;
        }
        match self.policy.evaluate(responses) {
            TriggerDecision::Wait => TriggerTransition::Unchanged,
            TriggerDecision::Fire => {
                self.state = TriggerState::Fired;
                TriggerTransition::Fired
            }
            TriggerDecision::Suppress => {
                self.state = TriggerState::Suppressed;
                TriggerTransition::Suppressed
            }
        }
    }

    /// Final decision once nothing more will arrive
    ///
    /// Gives the policy one last look and suppresses if it still waits.
    pub fn settle(&mut self, responses: &[ProviderResponse]) -> TriggerTransition {
        match self.observe(responses) {
            TriggerTransition::Unchanged if self.state == TriggerState::Waiting => {
                self.state = TriggerState::Suppressed;
                TriggerTransition::Suppressed
            }
            transition => transition,
        }
    }
}
