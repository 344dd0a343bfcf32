//! Degraded-mode answer selection

use crate::cleaning::ResponseCleaner;
use crate::core::provider::ProviderId;
use crate::response::ProviderResponse;
use crate::turn::answer::{DegradedReason, FinalAnswer};

/// Pick the best individual response when synthesis is not used
///
/// Best means the longest cleaned, non-empty text. Ties keep the provider
/// that was dispatched first.
pub fn select_fallback(responses: &[ProviderResponse]) -> Option<(ProviderId, String)> {
    let mut best: Option<(ProviderId, String)> = None;
    for response in responses.iter().filter(|r| r.is_success()) {
        let cleaned = ResponseCleaner::clean(&response.raw_text);
        if cleaned.is_empty() {
            continue;
        }
        let longer = best
            .as_ref()
            .is_none_or(|(_, text)| cleaned.chars().count() > text.chars().count());
        if longer {
            best = Some((response.provider.clone(), cleaned));
        }
    }
    best
}

/// The degraded answer for a turn whose trigger was suppressed
pub fn fallback_answer(responses: &[ProviderResponse]) -> FinalAnswer {
    match select_fallback(responses) {
        Some((provider, text)) => FinalAnswer::from_provider(provider, text),
        None => FinalAnswer::fallback(DegradedReason::NoResponses),
    }
}
