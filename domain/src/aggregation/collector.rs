//! Response collector for a single turn

use super::policy::TriggerPolicy;
use super::trigger::{SynthesisTrigger, TriggerState, TriggerTransition};
use crate::core::provider::ProviderId;
use crate::response::{ProviderError, ProviderResponse};

/// Point-in-time view of a turn's responses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Successful `(provider, raw text)` pairs in dispatch order
    pub successes: Vec<(ProviderId, String)>,
    pub pending: Vec<ProviderId>,
    pub failed: Vec<ProviderId>,
}

impl Snapshot {
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Accumulates provider responses and drives the synthesis trigger
///
/// Holds at most one entry per provider. Entries keep dispatch order; a
/// repeated record for the same provider replaces the earlier entry in place.
/// Callers sharing a collector across tasks must serialize access so that
/// each record and its trigger evaluation happen atomically.
#[derive(Debug, Clone, Default)]
pub struct ResponseCollector {
    entries: Vec<ProviderResponse>,
    trigger: SynthesisTrigger,
}

impl ResponseCollector {
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            entries: Vec::new(),
            trigger: SynthesisTrigger::new(policy),
        }
    }

    /// Register a pending entry for a provider about to be called
    pub fn dispatch(&mut self, provider: ProviderId) {
        let pending = ProviderResponse::pending(provider);
        self.upsert(pending);
    }

    /// Record a completed call and re-evaluate the trigger
    pub fn record(
        &mut self,
        provider: ProviderId,
        result: &Result<String, ProviderError>,
    ) -> TriggerTransition {
        self.upsert(ProviderResponse::from_result(provider, result));
        self.trigger.observe(&self.entries)
    }

    /// Fail everything still pending and let the trigger decide for good
    pub fn settle(&mut self) -> TriggerTransition {
        let no_response = ProviderError::upstream("no response");
        for entry in self.entries.iter_mut().filter(|e| e.is_pending()) {
            *entry = ProviderResponse::failed(entry.provider.clone(), &no_response);
        }
        self.trigger.settle(&self.entries)
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for entry in &self.entries {
            if entry.is_success() {
                snapshot
                    .successes
                    .push((entry.provider.clone(), entry.raw_text.clone()));
            } else if entry.is_pending() {
                snapshot.pending.push(entry.provider.clone());
            } else {
                snapshot.failed.push(entry.provider.clone());
            }
        }
        snapshot
    }

    pub fn get(&self, provider: &ProviderId) -> Option<&ProviderResponse> {
        self.entries.iter().find(|e| &e.provider == provider)
    }

    pub fn responses(&self) -> &[ProviderResponse] {
        &self.entries
    }

    pub fn into_responses(self) -> Vec<ProviderResponse> {
        self.entries
    }

    pub fn trigger_state(&self) -> TriggerState {
        self.trigger.state()
    }

    pub fn policy(&self) -> &TriggerPolicy {
        self.trigger.policy()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every dispatched provider has either succeeded or failed
    pub fn is_settled(&self) -> bool {
        self.entries.iter().all(|e| e.status.is_settled())
    }

    fn upsert(&mut self, response: ProviderResponse) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.provider == response.provider)
        {
            Some(existing) => *existing = response,
            None => self.entries.push(response),
        }
    }
}
