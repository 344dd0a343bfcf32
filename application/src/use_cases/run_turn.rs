//! Run Turn use case
//!
//! Fans one prompt out to every provider, records completions as they
//! arrive, fires synthesis when the trigger says so, and makes sure the turn
//! always ends with a final answer before it is handed to history.

use crate::config::TurnParams;
use crate::ports::history::{HistoryWriter, TurnRecord};
use crate::ports::progress::{NoProgress, TurnObserver};
use crate::ports::provider::{Credential, ProviderAdapter, ProviderRegistry};
use crate::use_cases::aggregator::{Aggregator, SynthesisOutcome};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use superai_domain::{
    ConversationTurn, DomainError, FinalAnswer, ProviderError, ProviderId, Question,
    TriggerTransition, TurnId,
};
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A turn shared between the running use case and its observers
pub type SharedTurn = Arc<Mutex<ConversationTurn>>;

/// Lock a shared turn, recovering the data if a holder panicked
pub fn lock_turn(turn: &SharedTurn) -> MutexGuard<'_, ConversationTurn> {
    turn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Errors that can occur during a turn
#[derive(Error, Debug)]
pub enum RunTurnError {
    #[error("No providers configured")]
    NoProviders,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Turn {0} was superseded by a newer prompt")]
    Superseded(TurnId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Input for the RunTurn use case
#[derive(Debug, Clone)]
pub struct RunTurnInput {
    pub question: Question,
    /// Providers to ask; empty means the configured default set
    pub providers: Vec<ProviderId>,
    /// Per-request keys, overriding server-side keys
    pub credentials: HashMap<ProviderId, Credential>,
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
}

impl RunTurnInput {
    pub fn new(question: Question) -> Self {
        Self {
            question,
            providers: Vec::new(),
            credentials: HashMap::new(),
            user_id: None,
            conversation_id: None,
        }
    }

    pub fn with_providers(mut self, providers: Vec<ProviderId>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_credential(mut self, provider: ProviderId, credential: Credential) -> Self {
        self.credentials.insert(provider, credential);
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }
}

/// A finished turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub turn: ConversationTurn,
    /// Set when the history store rejected the turn
    pub persist_error: Option<String>,
}

/// Use case for running one turn
pub struct RunTurnUseCase {
    registry: ProviderRegistry,
    aggregator: Aggregator,
    history: Arc<dyn HistoryWriter>,
    params: TurnParams,
}

impl RunTurnUseCase {
    pub fn new(
        registry: ProviderRegistry,
        aggregator: Aggregator,
        history: Arc<dyn HistoryWriter>,
        params: TurnParams,
    ) -> Self {
        Self {
            registry,
            aggregator,
            history,
            params,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn params(&self) -> &TurnParams {
        &self.params
    }

    /// Create an empty turn for this use case's trigger policy
    pub fn new_turn(&self, question: Question) -> SharedTurn {
        Arc::new(Mutex::new(ConversationTurn::new(
            question,
            self.params.policy.clone(),
        )))
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: RunTurnInput) -> Result<TurnOutcome, RunTurnError> {
        self.execute_with_progress(input, &NoProgress, CancellationToken::new())
            .await
    }

    /// Execute the use case with progress callbacks and a cancellation token
    pub async fn execute_with_progress(
        &self,
        input: RunTurnInput,
        observer: &dyn TurnObserver,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, RunTurnError> {
        let turn = self.new_turn(input.question.clone());
        self.execute_on(turn, input, observer, cancel).await
    }

    /// Run a turn that callers can watch while it is in flight
    pub async fn execute_on(
        &self,
        turn: SharedTurn,
        input: RunTurnInput,
        observer: &dyn TurnObserver,
        cancel: CancellationToken,
    ) -> Result<TurnOutcome, RunTurnError> {
        let adapters = self.resolve(&input.providers)?;
        let ids: Vec<ProviderId> = adapters.iter().map(|a| a.provider().clone()).collect();

        let missing = self.params.policy.missing_required(&ids);
        if !missing.is_empty() {
            let names: Vec<&str> = missing.iter().map(|id| id.as_str()).collect();
            warn!(
                missing = %names.join(","),
                policy = %self.params.policy,
                "Required providers not dispatched; synthesis cannot fire for this turn"
            );
        }

        let turn_id = {
            let mut guard = lock_turn(&turn);
            for id in &ids {
                guard.dispatch(id.clone())?;
            }
            guard.id()
        };

        info!(turn_id = %turn_id, providers = ids.len(), "Dispatching prompt");
        observer.on_dispatch(turn_id, &ids);

        let mut providers = JoinSet::new();
        for adapter in adapters {
            let credential = input.credentials.get(adapter.provider()).cloned();
            let prompt = input.question.content().to_string();
            let timeout = self.params.provider_timeout;

            providers.spawn(async move {
                let id = adapter.provider().clone();
                let result = match tokio::time::timeout(timeout, adapter.call(&prompt, credential))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::timeout(timeout)),
                };
                (id, result)
            });
        }

        let mut synthesis: JoinSet<SynthesisOutcome> = JoinSet::new();

        while !providers.is_empty() || !synthesis.is_empty() {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    providers.abort_all();
                    synthesis.abort_all();
                    info!(turn_id = %turn_id, "Turn superseded, discarding in-flight work");
                    return Err(RunTurnError::Superseded(turn_id));
                }

                Some(joined) = providers.join_next() => match joined {
                    Ok((id, result)) => {
                        self.on_provider_complete(&turn, id, result, observer, &mut synthesis);
                    }
                    Err(e) => warn!("Provider task join error: {}", e),
                },

                Some(joined) = synthesis.join_next() => match joined {
                    Ok(outcome) => self.on_synthesis_complete(&turn, outcome, observer),
                    Err(e) => warn!("Synthesis task join error: {}", e),
                },
            }
        }

        self.conclude(&turn, observer, &cancel).await?;

        let record = TurnRecord::from_turn(
            &lock_turn(&turn),
            input.user_id.clone(),
            input.conversation_id.clone(),
        );

        let persist_error = match record {
            Some(record) => match self.history.persist_turn(&record).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(turn_id = %turn_id, "Failed to persist turn: {}", e);
                    Some(e.to_string())
                }
            },
            None => None,
        };

        let sealed = {
            let mut guard = lock_turn(&turn);
            guard.seal()?;
            guard.clone()
        };
        debug!(turn_id = %turn_id, state = %sealed.state(), "Turn sealed");

        Ok(TurnOutcome {
            turn: sealed,
            persist_error,
        })
    }

    /// Adapters for the requested providers, in dispatch order
    fn resolve(
        &self,
        requested: &[ProviderId],
    ) -> Result<Vec<Arc<dyn ProviderAdapter>>, RunTurnError> {
        if self.registry.is_empty() {
            return Err(RunTurnError::NoProviders);
        }

        let wanted = if !requested.is_empty() {
            requested
        } else {
            &self.params.dispatch
        };

        if wanted.is_empty() {
            return Ok(self.registry.iter().cloned().collect());
        }

        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = Vec::new();
        for id in wanted {
            let adapter = self
                .registry
                .get(id)
                .ok_or_else(|| RunTurnError::UnknownProvider(id.to_string()))?;
            if !adapters.iter().any(|a| a.provider() == id) {
                adapters.push(adapter);
            }
        }
        Ok(adapters)
    }

    fn on_provider_complete(
        &self,
        turn: &SharedTurn,
        id: ProviderId,
        result: Result<String, ProviderError>,
        observer: &dyn TurnObserver,
        synthesis: &mut JoinSet<SynthesisOutcome>,
    ) {
        match &result {
            Ok(text) => info!(provider = %id, chars = text.len(), "Provider responded"),
            Err(e) => warn!(provider = %id, "Provider failed: {}", e),
        }

        let mut guard = lock_turn(turn);
        let transition = match guard.record(id.clone(), &result) {
            Ok(transition) => transition,
            Err(e) => {
                warn!(provider = %id, "Dropping response: {}", e);
                return;
            }
        };

        if let Some(response) = guard.response(&id) {
            let cleaned = guard.cleaned_text(&id).unwrap_or_default();
            observer.on_provider_complete(response, &cleaned);
        }

        match transition {
            TriggerTransition::Fired => {
                let request = guard.synthesis_request();
                drop(guard);
                if request.is_empty() {
                    warn!("Trigger fired but no usable text to synthesize");
                    return;
                }
                info!(responses = request.len(), "Synthesis triggered");
                observer.on_synthesis_start(request.len());
                let aggregator = self.aggregator.clone();
                synthesis.spawn(async move { aggregator.run(&request).await });
            }
            TriggerTransition::Suppressed => {
                info!(
                    "Synthesis suppressed ({}), answering from the best response",
                    guard.snapshot().failed.len()
                );
            }
            TriggerTransition::Unchanged => {}
        }
    }

    fn on_synthesis_complete(
        &self,
        turn: &SharedTurn,
        outcome: SynthesisOutcome,
        observer: &dyn TurnObserver,
    ) {
        let answer = outcome.into_final_answer();
        let mut guard = lock_turn(turn);
        match guard.finish(answer.clone()) {
            Ok(()) => observer.on_final_answer(&answer),
            Err(e) => warn!("Discarding synthesis result: {}", e),
        }
    }

    /// Settle stragglers and make sure a final answer exists
    async fn conclude(
        &self,
        turn: &SharedTurn,
        observer: &dyn TurnObserver,
        cancel: &CancellationToken,
    ) -> Result<(), RunTurnError> {
        let (transition, turn_id) = {
            let mut guard = lock_turn(turn);
            (guard.settle()?, guard.id())
        };

        if transition == TriggerTransition::Fired {
            let request = lock_turn(turn).synthesis_request();
            if !request.is_empty() {
                observer.on_synthesis_start(request.len());
                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(RunTurnError::Superseded(turn_id)),
                    outcome = self.aggregator.run(&request) => outcome,
                };
                self.on_synthesis_complete(turn, outcome, observer);
            }
        }

        let fallback: Option<FinalAnswer> = {
            let mut guard = lock_turn(turn);
            if guard.final_answer().is_none() {
                let answer = guard.fallback_answer();
                guard.finish(answer.clone())?;
                Some(answer)
            } else {
                None
            }
        };
        if let Some(answer) = fallback {
            info!(turn_id = %turn_id, source = answer.source.as_str(), "Turn answered without synthesis");
            observer.on_final_answer(&answer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SynthesisOptions;
    use crate::use_cases::test_support::{MockProvider, RecordingHistory};
    use std::time::Duration;
    use superai_domain::{
        AnswerSource, DegradedReason, ErrorKind, ProviderResponse, TriggerPolicy, TurnState,
    };

    struct CollectingObserver {
        completed: Mutex<Vec<(ProviderId, String)>>,
        synthesis_started: Mutex<usize>,
    }

    impl CollectingObserver {
        fn new() -> Self {
            Self {
                completed: Mutex::new(Vec::new()),
                synthesis_started: Mutex::new(0),
            }
        }
    }

    impl TurnObserver for CollectingObserver {
        fn on_dispatch(&self, _turn_id: TurnId, _providers: &[ProviderId]) {}

        fn on_provider_complete(&self, response: &ProviderResponse, cleaned: &str) {
            self.completed
                .lock()
                .unwrap()
                .push((response.provider.clone(), cleaned.to_string()));
        }

        fn on_synthesis_start(&self, _responses: usize) {
            *self.synthesis_started.lock().unwrap() += 1;
        }
    }

    fn use_case(
        providers: Vec<Arc<MockProvider>>,
        synth: Arc<MockProvider>,
        history: Arc<RecordingHistory>,
        policy: TriggerPolicy,
    ) -> RunTurnUseCase {
        let mut registry = ProviderRegistry::new();
        for p in providers {
            registry.register(p);
        }
        let aggregator = Aggregator::new(
            synth,
            SynthesisOptions::default().with_retry_backoff(Duration::ZERO),
        );
        RunTurnUseCase::new(
            registry,
            aggregator,
            history,
            TurnParams::default().with_policy(policy),
        )
    }

    fn question() -> Question {
        Question::new("What is the capital of France?").unwrap()
    }

    #[tokio::test]
    async fn test_scenario_synthesis_succeeds() {
        let gemini = Arc::new(MockProvider::ok(ProviderId::Gemini, "Paris is the capital."));
        let deepseek = Arc::new(MockProvider::ok(
            ProviderId::DeepSeek,
            "<think>reasoning</think>The capital of France is Paris.",
        ));
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "Paris is the capital of France.",
        ));
        let history = Arc::new(RecordingHistory::default());
        let uc = use_case(
            vec![gemini, deepseek],
            synth.clone(),
            history.clone(),
            TriggerPolicy::default(),
        );

        let outcome = uc.execute(RunTurnInput::new(question())).await.unwrap();
        let turn = outcome.turn;

        assert_eq!(turn.state(), TurnState::Complete);
        assert!(turn.is_sealed());
        let answer = turn.final_answer().unwrap();
        assert_eq!(answer.text, "Paris is the capital of France.");
        assert!(!answer.is_degraded());

        let sent = synth.last_request().unwrap();
        assert!(sent.prompt.contains("Paris is the capital."));
        assert!(sent.prompt.contains("The capital of France is Paris."));
        assert!(!sent.prompt.contains("<think>"));
        assert!(!sent.prompt.contains("Gemini"));
        assert!(!sent.prompt.contains("DeepSeek"));

        assert_eq!(history.count(), 1);
        assert!(outcome.persist_error.is_none());
    }

    #[tokio::test]
    async fn test_scenario_required_provider_fails() {
        let gemini = Arc::new(MockProvider::err(
            ProviderId::Gemini,
            ProviderError::new(ErrorKind::Auth, "invalid key"),
        ));
        let deepseek = Arc::new(MockProvider::ok(
            ProviderId::DeepSeek,
            "<think>reasoning</think>The capital of France is Paris.",
        ));
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "should never be used",
        ));
        let history = Arc::new(RecordingHistory::default());
        let uc = use_case(
            vec![gemini, deepseek],
            synth.clone(),
            history.clone(),
            TriggerPolicy::default(),
        );
        let observer = CollectingObserver::new();

        let outcome = uc
            .execute_with_progress(
                RunTurnInput::new(question()),
                &observer,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(synth.calls(), 0);
        assert_eq!(*observer.synthesis_started.lock().unwrap(), 0);
        let turn = outcome.turn;
        assert_eq!(turn.state(), TurnState::Degraded);
        let answer = turn.final_answer().unwrap();
        assert_eq!(answer.text, "The capital of France is Paris.");
        assert_eq!(
            answer.source,
            AnswerSource::Provider {
                provider: ProviderId::DeepSeek
            }
        );
        assert_eq!(observer.completed.lock().unwrap().len(), 2);
        assert!(history.records.lock().unwrap()[0].degraded);
    }

    #[tokio::test]
    async fn test_scenario_synthesis_too_short() {
        let gemini = Arc::new(MockProvider::ok(ProviderId::Gemini, "Paris is the capital."));
        let deepseek = Arc::new(MockProvider::ok(ProviderId::DeepSeek, "Paris."));
        let synth = Arc::new(MockProvider::ok(ProviderId::Custom("synth".into()), "Paris"));
        let history = Arc::new(RecordingHistory::default());
        let uc = use_case(
            vec![gemini, deepseek],
            synth,
            history.clone(),
            TriggerPolicy::default(),
        );

        let outcome = uc.execute(RunTurnInput::new(question())).await.unwrap();
        let turn = outcome.turn;
        assert_eq!(turn.state(), TurnState::Degraded);
        let answer = turn.final_answer().unwrap();
        assert_eq!(
            answer.source,
            AnswerSource::Fallback {
                reason: DegradedReason::TooShort
            }
        );
        assert!(answer.text.starts_with("I couldn't generate a comprehensive summary"));
        assert_eq!(history.count(), 1);
    }

    #[tokio::test]
    async fn test_trigger_fires_once_with_many_fast_providers() {
        let providers: Vec<Arc<MockProvider>> = [
            ProviderId::Gpt,
            ProviderId::Claude,
            ProviderId::Gemini,
            ProviderId::DeepSeek,
            ProviderId::Llama,
            ProviderId::Devstral,
        ]
        .into_iter()
        .map(|id| Arc::new(MockProvider::ok(id, "A perfectly reasonable answer.")))
        .collect();
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "One combined and sufficiently long answer.",
        ));
        let uc = use_case(
            providers,
            synth.clone(),
            Arc::new(RecordingHistory::default()),
            TriggerPolicy::AtLeast(2),
        );

        let outcome = uc.execute(RunTurnInput::new(question())).await.unwrap();
        assert_eq!(synth.calls(), 1);
        assert_eq!(outcome.turn.state(), TurnState::Complete);
        assert_eq!(outcome.turn.responses().len(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_timeout_is_upstream_failure() {
        let gemini = Arc::new(MockProvider::ok(ProviderId::Gemini, "Paris is the capital."));
        let slow = Arc::new(
            MockProvider::ok(ProviderId::DeepSeek, "too late").with_delay(Duration::from_secs(600)),
        );
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "Paris is the capital of France.",
        ));
        let uc = use_case(
            vec![gemini, slow],
            synth.clone(),
            Arc::new(RecordingHistory::default()),
            TriggerPolicy::default(),
        );

        let outcome = uc.execute(RunTurnInput::new(question())).await.unwrap();
        let turn = outcome.turn;
        let deepseek = turn.response(&ProviderId::DeepSeek).unwrap();
        assert_eq!(deepseek.error_kind, Some(ErrorKind::UpstreamUnavailable));
        assert_eq!(synth.calls(), 0);
        assert_eq!(turn.final_answer().unwrap().text, "Paris is the capital.");
    }

    #[tokio::test]
    async fn test_persist_error_is_surfaced() {
        let gpt = Arc::new(MockProvider::ok(ProviderId::Gpt, "An answer long enough."));
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "A synthesized answer of decent length.",
        ));
        let uc = use_case(
            vec![gpt],
            synth,
            Arc::new(RecordingHistory::failing()),
            TriggerPolicy::AllSettled,
        );

        let outcome = uc.execute(RunTurnInput::new(question())).await.unwrap();
        assert!(outcome.persist_error.unwrap().contains("disk full"));
        assert!(outcome.turn.is_sealed());
    }

    #[tokio::test]
    async fn test_selection_without_required_providers_falls_back() {
        let gpt = Arc::new(MockProvider::ok(
            ProviderId::Gpt,
            "Paris has been the capital of France for centuries.",
        ));
        let gemini = Arc::new(MockProvider::ok(ProviderId::Gemini, "Paris."));
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "should never be used",
        ));
        let history = Arc::new(RecordingHistory::default());
        let uc = use_case(
            vec![gpt.clone(), gemini.clone()],
            synth.clone(),
            history.clone(),
            TriggerPolicy::default(),
        );

        let input = RunTurnInput::new(question()).with_providers(vec![ProviderId::Gpt]);
        let outcome = uc.execute(input).await.unwrap();

        assert_eq!(outcome.turn.state(), TurnState::Degraded);
        assert_eq!(
            outcome.turn.final_answer().unwrap().text,
            "Paris has been the capital of France for centuries."
        );
        assert_eq!(gemini.calls(), 0);
        assert_eq!(synth.calls(), 0);
        assert_eq!(history.count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected_before_dispatch() {
        let gpt = Arc::new(MockProvider::ok(ProviderId::Gpt, "x"));
        let synth = Arc::new(MockProvider::ok(ProviderId::Custom("synth".into()), "x"));
        let uc = use_case(
            vec![gpt.clone()],
            synth,
            Arc::new(RecordingHistory::default()),
            TriggerPolicy::AllSettled,
        );

        let input = RunTurnInput::new(question())
            .with_providers(vec![ProviderId::Gpt, ProviderId::Claude]);
        let err = uc.execute(input).await.unwrap_err();
        assert!(matches!(err, RunTurnError::UnknownProvider(name) if name == "claude"));
        assert_eq!(gpt.calls(), 0);
    }

    #[tokio::test]
    async fn test_request_credential_reaches_adapter() {
        let claude = Arc::new(MockProvider::ok(ProviderId::Claude, "Claude says hi there."));
        let synth = Arc::new(MockProvider::ok(
            ProviderId::Custom("synth".into()),
            "A synthesized answer of decent length.",
        ));
        let uc = use_case(
            vec![claude.clone()],
            synth,
            Arc::new(RecordingHistory::default()),
            TriggerPolicy::AllSettled,
        );

        let input = RunTurnInput::new(question()).with_credential(
            ProviderId::Claude,
            Credential::new("sk-ant-user").unwrap(),
        );
        uc.execute(input).await.unwrap();
        let sent = claude.last_request().unwrap();
        assert_eq!(sent.credential.unwrap().expose(), "sk-ant-user");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_turn_is_not_persisted() {
        let slow = Arc::new(
            MockProvider::ok(ProviderId::Gpt, "late answer").with_delay(Duration::from_secs(30)),
        );
        let synth = Arc::new(MockProvider::ok(ProviderId::Custom("synth".into()), "x"));
        let history = Arc::new(RecordingHistory::default());
        let uc = use_case(
            vec![slow],
            synth,
            history.clone(),
            TriggerPolicy::AllSettled,
        );

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let err = uc
            .execute_with_progress(RunTurnInput::new(question()), &NoProgress, cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RunTurnError::Superseded(_)));
        assert_eq!(history.count(), 0);
    }
}
