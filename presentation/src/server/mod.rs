//! HTTP API
//!
//! Exposes single-provider calls, stand-alone synthesis and full turns over
//! JSON. Routes:
//!
//! | Method | Path                  | Handler         |
//! |--------|-----------------------|-----------------|
//! | POST   | `/api/{provider}`     | one provider    |
//! | POST   | `/api/synthesize`     | synthesis       |
//! | POST   | `/api/summary`        | synthesis alias |
//! | POST   | `/api/turns`          | full turn       |
//! | GET    | `/api/conversations`  | user history    |
//! | GET    | `/api/health`         | liveness        |

pub mod dto;
pub mod error;
mod handlers;

use axum::Router;
use axum::routing::{get, post};
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use superai_application::{
    AskProviderUseCase, ChatSession, HistoryReader, RunTurnUseCase, SynthesizeUseCase,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// One [`ChatSession`] per user id, so a user's new turn supersedes their last
///
/// Sessions live only while a lease on them is held. Releasing the last lease
/// removes the user's entry.
pub struct SessionRegistry {
    run_turn: Arc<RunTurnUseCase>,
    sessions: Mutex<HashMap<String, Arc<ChatSession>>>,
}

/// A user's session, held for the duration of one request
pub struct SessionLease {
    registry: Arc<SessionRegistry>,
    user_id: String,
    session: Arc<ChatSession>,
}

impl std::ops::Deref for SessionLease {
    type Target = ChatSession;

    fn deref(&self) -> &ChatSession {
        &self.session
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        // The map's reference plus this lease's own.
        let mut sessions = self.registry.sessions();
        if sessions
            .get(&self.user_id)
            .is_some_and(|s| Arc::strong_count(s) == 2)
        {
            sessions.remove(&self.user_id);
            debug!(user_id = %self.user_id, "Evicted idle session");
        }
    }
}

impl SessionRegistry {
    pub fn new(run_turn: Arc<RunTurnUseCase>) -> Self {
        Self {
            run_turn,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// The user's session, created on first use
    pub fn lease(self: &Arc<Self>, user_id: &str) -> SessionLease {
        let session = self
            .sessions()
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(ChatSession::new(self.run_turn.clone())))
            .clone();
        SessionLease {
            registry: Arc::clone(self),
            user_id: user_id.to_string(),
            session,
        }
    }

    /// Number of users with a session currently leased
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<ChatSession>>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct ApiState {
    pub run_turn: Arc<RunTurnUseCase>,
    pub ask: Arc<AskProviderUseCase>,
    pub synthesize: Arc<SynthesizeUseCase>,
    pub history: Arc<dyn HistoryReader>,
    pub sessions: Arc<SessionRegistry>,
}

impl ApiState {
    pub fn new(
        run_turn: Arc<RunTurnUseCase>,
        ask: Arc<AskProviderUseCase>,
        synthesize: Arc<SynthesizeUseCase>,
        history: Arc<dyn HistoryReader>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(run_turn.clone()));
        Self {
            run_turn,
            ask,
            synthesize,
            history,
            sessions,
        }
    }
}

/// The HTTP server
pub struct ApiServer {
    state: ApiState,
    bind: SocketAddr,
    permissive_cors: bool,
}

impl ApiServer {
    pub fn new(state: ApiState, bind: SocketAddr) -> Self {
        Self {
            state,
            bind,
            permissive_cors: true,
        }
    }

    pub fn with_permissive_cors(mut self, enabled: bool) -> Self {
        self.permissive_cors = enabled;
        self
    }

    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/api/health", get(handlers::health))
            .route("/api/conversations", get(handlers::conversations))
            .route("/api/turns", post(handlers::run_turn))
            .route("/api/synthesize", post(handlers::synthesize))
            .route("/api/summary", post(handlers::synthesize))
            .route("/api/{provider}", post(handlers::ask_provider))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        if self.permissive_cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Serve until `shutdown` resolves
    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.bind).await?;
        info!("API listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}
