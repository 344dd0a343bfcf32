//! HTTP handlers

use super::ApiState;
use super::dto::{
    ConversationsQuery, ConversationsReply, HealthReply, ProviderReply, ProviderRequest,
    SynthesizeReply, SynthesizeRequest, TurnRequest,
};
use super::error::ApiError;
use crate::output::view::TurnView;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use superai_application::{Credential, RunTurnInput, TurnObserver};
use superai_domain::{FinalAnswer, ProviderId, ProviderResponse, Question, TurnId};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Logs turn progress for the server, where there is no terminal to draw on
struct LogProgress;

impl TurnObserver for LogProgress {
    fn on_dispatch(&self, turn_id: TurnId, providers: &[ProviderId]) {
        info!(turn_id = %turn_id, providers = providers.len(), "Turn dispatched");
    }

    fn on_provider_complete(&self, response: &ProviderResponse, _cleaned: &str) {
        info!(
            provider = %response.provider,
            status = response.status.as_str(),
            "Provider answered"
        );
    }

    fn on_final_answer(&self, answer: &FinalAnswer) {
        info!(source = answer.source.as_str(), degraded = answer.is_degraded(), "Final answer set");
    }
}

/// `POST /api/{provider}`
pub async fn ask_provider(
    State(state): State<ApiState>,
    Path(provider): Path<String>,
    body: Result<Json<ProviderRequest>, JsonRejection>,
) -> Result<Json<ProviderReply>, ApiError> {
    let Json(request) = body?;
    let id = ProviderId::from(provider.as_str());
    let credential = request.api_key.clone().and_then(Credential::new);

    let result = state.ask.execute(&id, request.text(), credential).await?;
    Ok(Json(ProviderReply { result }))
}

/// `POST /api/synthesize` and `POST /api/summary`
pub async fn synthesize(
    State(state): State<ApiState>,
    body: Result<Json<SynthesizeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let message = request.message.unwrap_or_default();
    let responses = request
        .responses
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, item)| item.into_pair(i))
        .collect();

    let report = state.synthesize.execute(&message, responses).await?;
    let reply = SynthesizeReply::from_report(&message, report);
    let status = if reply.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(reply)))
}

/// `POST /api/turns`
pub async fn run_turn(
    State(state): State<ApiState>,
    body: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<TurnView>, ApiError> {
    let Json(request) = body?;
    let question = Question::new(request.prompt.unwrap_or_default())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let mut input = RunTurnInput::new(question).with_providers(
        request
            .providers
            .iter()
            .map(|p| ProviderId::from(p.as_str()))
            .collect(),
    );
    for (provider, key) in request.api_keys {
        if let Some(credential) = Credential::new(key) {
            input = input.with_credential(ProviderId::from(provider.as_str()), credential);
        }
    }
    if let Some(conversation_id) = request.conversation_id {
        input = input.with_conversation(conversation_id);
    }

    let outcome = match request.user_id.filter(|u| !u.trim().is_empty()) {
        Some(user_id) => {
            let session = state.sessions.lease(&user_id);
            session
                .submit(input.with_user(user_id), &LogProgress)
                .await?
        }
        None => {
            state
                .run_turn
                .execute_with_progress(input, &LogProgress, CancellationToken::new())
                .await?
        }
    };

    Ok(Json(TurnView::from_outcome(&outcome)))
}

/// `GET /api/conversations?userId=&conversationId=`
pub async fn conversations(
    State(state): State<ApiState>,
    Query(query): Query<ConversationsQuery>,
) -> Result<Json<ConversationsReply>, ApiError> {
    let user_id = query
        .user_id
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing userId".to_string()))?;
    let conversation_id = query.conversation_id.filter(|c| !c.trim().is_empty());
    let turns = state
        .history
        .list_turns(&user_id, conversation_id.as_deref())
        .await?;
    Ok(Json(ConversationsReply { turns }))
}

/// `GET /api/health`
pub async fn health(State(state): State<ApiState>) -> Json<HealthReply> {
    Json(HealthReply {
        status: "healthy",
        providers: state.run_turn.registry().ids(),
        synthesis_model: state.synthesize.model().to_string(),
        timestamp: Utc::now(),
    })
}
