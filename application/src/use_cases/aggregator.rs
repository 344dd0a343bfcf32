//! Aggregator
//!
//! Owns the single synthesis call of a turn: prompt composition, timeout,
//! retry of transient failures, and cleaning of the result.

use crate::config::SynthesisOptions;
use crate::ports::provider::{CompletionRequest, ProviderAdapter};
use std::sync::Arc;
use superai_domain::{
    DegradedReason, FinalAnswer, PromptTemplate, ProviderError, ResponseCleaner, SynthesisPrompt,
    SynthesisRequest,
};
use tracing::{debug, info, warn};

/// What came of a synthesis attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    /// Usable, cleaned text
    Synthesized { text: String, model: String },
    /// Call succeeded but the cleaned text was below the usable length
    TooShort { text: String },
    /// Call failed after all attempts
    Failed(ProviderError),
}

impl SynthesisOutcome {
    pub fn is_synthesized(&self) -> bool {
        matches!(self, SynthesisOutcome::Synthesized { .. })
    }

    /// The answer shown to the user for this outcome
    pub fn into_final_answer(self) -> FinalAnswer {
        match self {
            SynthesisOutcome::Synthesized { text, model } => FinalAnswer::synthesized(text, model),
            SynthesisOutcome::TooShort { .. } => FinalAnswer::fallback(DegradedReason::TooShort),
            SynthesisOutcome::Failed(e) => {
                FinalAnswer::fallback(DegradedReason::from_error_kind(e.kind))
            }
        }
    }
}

/// Calls the designated synthesis provider
#[derive(Clone)]
pub struct Aggregator {
    provider: Arc<dyn ProviderAdapter>,
    options: SynthesisOptions,
}

impl Aggregator {
    pub fn new(provider: Arc<dyn ProviderAdapter>, options: SynthesisOptions) -> Self {
        Self { provider, options }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    /// Raw synthesis call with timeout and transient-only retry
    pub async fn synthesize(&self, prompt: &SynthesisPrompt) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(prompt.user.clone())
            .with_system(prompt.system.clone())
            .with_temperature(self.options.temperature)
            .with_top_p(self.options.top_p)
            .with_max_tokens(self.options.max_tokens);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result =
                match tokio::time::timeout(self.options.timeout, self.provider.complete(&request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::timeout(self.options.timeout)),
                };

            match result {
                Err(e) if e.is_transient() && attempt <= self.options.max_retries => {
                    warn!(
                        "Synthesis attempt {} with {} failed ({}), retrying",
                        attempt,
                        self.model(),
                        e
                    );
                    tokio::time::sleep(self.options.retry_backoff).await;
                }
                other => return other,
            }
        }
    }

    /// Compose, call, clean, and judge the result
    pub async fn run(&self, request: &SynthesisRequest) -> SynthesisOutcome {
        let prompt = PromptTemplate::compose(request);
        info!(
            "Synthesizing {} responses with {}",
            request.len(),
            self.model()
        );

        match self.synthesize(&prompt).await {
            Ok(raw) => {
                let text = ResponseCleaner::clean(&raw);
                if text.chars().count() < self.options.min_usable_chars {
                    warn!(
                        "Synthesis output too short ({} chars after cleaning)",
                        text.chars().count()
                    );
                    SynthesisOutcome::TooShort { text }
                } else {
                    debug!("Synthesis produced {} chars", text.len());
                    SynthesisOutcome::Synthesized {
                        text,
                        model: self.model().to_string(),
                    }
                }
            }
            Err(e) => {
                warn!("Synthesis failed: {}", e);
                SynthesisOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::MockProvider;
    use std::time::Duration;
    use superai_domain::{AnswerSource, ErrorKind, ProviderId};

    fn request() -> SynthesisRequest {
        SynthesisRequest::new(
            "What is the capital of France?",
            vec![
                (ProviderId::Gemini, "Paris is the capital.".to_string()),
                (ProviderId::DeepSeek, "The capital of France is Paris.".to_string()),
            ],
        )
    }

    fn options() -> SynthesisOptions {
        SynthesisOptions::default().with_retry_backoff(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_synthesized_passes_options() {
        let mock = Arc::new(MockProvider::ok(
            ProviderId::DeepSeek,
            "Paris is the capital of France.",
        ));
        let aggregator = Aggregator::new(mock.clone(), options());

        let outcome = aggregator.run(&request()).await;
        assert_eq!(
            outcome,
            SynthesisOutcome::Synthesized {
                text: "Paris is the capital of France.".to_string(),
                model: "deepseek-mock".to_string(),
            }
        );

        let sent = mock.last_request().unwrap();
        assert_eq!(sent.temperature, Some(0.3));
        assert_eq!(sent.top_p, Some(0.8));
        assert_eq!(sent.max_tokens, Some(2000));
        assert!(sent.system.is_some());
        assert!(sent.prompt.contains("Response 2:\nThe capital of France is Paris."));
    }

    #[tokio::test]
    async fn test_too_short_is_soft_failure() {
        let mock = Arc::new(MockProvider::ok(ProviderId::DeepSeek, "<think>long</think>Paris."));
        let aggregator = Aggregator::new(mock, options());

        let outcome = aggregator.run(&request()).await;
        assert!(matches!(outcome, SynthesisOutcome::TooShort { .. }));
        let answer = outcome.into_final_answer();
        assert!(answer.is_degraded());
        assert!(answer.text.starts_with("I couldn't generate a comprehensive summary"));
    }

    #[tokio::test]
    async fn test_retries_transient_once() {
        let mock = Arc::new(
            MockProvider::ok(ProviderId::DeepSeek, "Paris is the capital of France.").scripted(
                vec![Err(ProviderError::new(ErrorKind::RateLimited, "slow down"))],
            ),
        );
        let aggregator = Aggregator::new(mock.clone(), options());

        let outcome = aggregator.run(&request()).await;
        assert!(outcome.is_synthesized());
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let mock = Arc::new(MockProvider::err(
            ProviderId::DeepSeek,
            ProviderError::auth("invalid token"),
        ));
        let aggregator = Aggregator::new(mock.clone(), options());

        let outcome = aggregator.run(&request()).await;
        assert_eq!(mock.calls(), 1);
        let answer = outcome.into_final_answer();
        assert_eq!(
            answer.source,
            AnswerSource::Fallback {
                reason: DegradedReason::Auth
            }
        );
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let mock = Arc::new(MockProvider::err(
            ProviderId::DeepSeek,
            ProviderError::upstream("503"),
        ));
        let aggregator = Aggregator::new(mock.clone(), options().with_max_retries(2));

        let outcome = aggregator.run(&request()).await;
        assert_eq!(mock.calls(), 3);
        assert_eq!(
            outcome.into_final_answer().text,
            "I'm experiencing technical issues. Please try again shortly."
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_upstream_unavailable() {
        let mock = Arc::new(
            MockProvider::ok(ProviderId::DeepSeek, "Paris is the capital of France.")
                .with_delay(Duration::from_secs(120)),
        );
        let aggregator = Aggregator::new(mock, options().with_max_retries(0));

        let outcome = aggregator.run(&request()).await;
        match outcome {
            SynthesisOutcome::Failed(e) => assert_eq!(e.kind, ErrorKind::UpstreamUnavailable),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
