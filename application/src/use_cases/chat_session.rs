//! Chat session
//!
//! Keeps at most one turn in flight per session. Submitting a new prompt
//! cancels the previous turn, whose late results are then dropped instead of
//! leaking into the new one.

use crate::ports::progress::TurnObserver;
use crate::use_cases::run_turn::{
    RunTurnError, RunTurnInput, RunTurnUseCase, SharedTurn, TurnOutcome, lock_turn,
};
use std::sync::{Arc, Mutex};
use superai_domain::ConversationTurn;
use tokio_util::sync::CancellationToken;
use tracing::info;

struct ActiveTurn {
    turn: SharedTurn,
    cancel: CancellationToken,
}

/// One user's stream of turns
pub struct ChatSession {
    use_case: Arc<RunTurnUseCase>,
    active: Mutex<Option<ActiveTurn>>,
}

impl ChatSession {
    pub fn new(use_case: Arc<RunTurnUseCase>) -> Self {
        Self {
            use_case,
            active: Mutex::new(None),
        }
    }

    /// Run a new turn, superseding whatever turn is still in flight
    pub async fn submit(
        &self,
        input: RunTurnInput,
        observer: &dyn TurnObserver,
    ) -> Result<TurnOutcome, RunTurnError> {
        let turn = self.use_case.new_turn(input.question.clone());
        let cancel = CancellationToken::new();

        let previous = self.active().replace(ActiveTurn {
            turn: Arc::clone(&turn),
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            let previous_id = lock_turn(&previous.turn).id();
            info!(turn_id = %previous_id, "Superseding in-flight turn");
            previous.cancel.cancel();
        }

        let _release = Release {
            session: self,
            turn: Arc::clone(&turn),
        };
        self.use_case
            .execute_on(turn, input, observer, cancel)
            .await
    }

    /// Copy of the turn currently in flight, if any
    pub fn current(&self) -> Option<ConversationTurn> {
        self.active()
            .as_ref()
            .map(|a| lock_turn(&a.turn).clone())
    }

    /// Cancel the in-flight turn without starting a new one
    pub fn cancel(&self) {
        if let Some(active) = self.active().take() {
            active.cancel.cancel();
        }
    }

    fn active(&self) -> std::sync::MutexGuard<'_, Option<ActiveTurn>> {
        self.active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Clears the session's active slot when its submit ends or is dropped
struct Release<'a> {
    session: &'a ChatSession,
    turn: SharedTurn,
}

impl Drop for Release<'_> {
    fn drop(&mut self) {
        let mut active = self.session.active();
        if active
            .as_ref()
            .is_some_and(|a| Arc::ptr_eq(&a.turn, &self.turn))
        {
            if let Some(abandoned) = active.take() {
                abandoned.cancel.cancel();
            }
        }
    }
}
