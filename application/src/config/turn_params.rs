//! Turn parameters: fan-out control.
//!
//! [`TurnParams`] groups the static parameters of
//! [`RunTurnUseCase`](crate::use_cases::run_turn::RunTurnUseCase).

use std::time::Duration;
use superai_domain::{ProviderId, TriggerPolicy};

/// Fan-out and trigger parameters for a turn.
#[derive(Debug, Clone)]
pub struct TurnParams {
    /// When synthesis fires.
    pub policy: TriggerPolicy,
    /// Upper bound for each provider call.
    pub provider_timeout: Duration,
    /// Providers used when a request names none. Empty means every registered one.
    pub dispatch: Vec<ProviderId>,
}

impl Default for TurnParams {
    fn default() -> Self {
        Self {
            policy: TriggerPolicy::default(),
            provider_timeout: Duration::from_secs(60),
            dispatch: Vec::new(),
        }
    }
}

impl TurnParams {
    pub fn with_policy(mut self, policy: TriggerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_dispatch(mut self, providers: Vec<ProviderId>) -> Self {
        self.dispatch = providers;
        self
    }
}
