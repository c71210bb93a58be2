//! REST endpoints for driving a questionnaire session.
//!
//! Every mutating call returns the resulting `SessionView` so a client can
//! render the session without a follow-up read.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::registry::SessionRegistry;
use super::session::{AdvanceOutcome, RetreatOutcome, SessionView};
use crate::api::{AppState, client_info, prediction_error_response};
use crate::error::{PredictionError, QuestionnaireError};
use crate::oracle::PredictionRequest;

/// Shared state for questionnaire routes.
#[derive(Clone)]
pub struct QuestionnaireRouteState {
    pub sessions: Arc<SessionRegistry>,
    pub app: AppState,
}

#[derive(Deserialize)]
struct PendingValue {
    value: String,
}

fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid session ID"})),
        )
            .into_response()
    })
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"error": "Session not found"})),
    )
        .into_response()
}

fn questionnaire_error(e: &QuestionnaireError) -> Response {
    match e {
        QuestionnaireError::InvalidTransition { operation, phase } => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": e.to_string(),
                "operation": operation,
                "phase": phase,
            })),
        )
            .into_response(),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Run `op` on the session named by `id` and render the result.
async fn apply<T>(
    state: &QuestionnaireRouteState,
    id: &str,
    op: impl FnOnce(&mut super::Questionnaire) -> Result<T, QuestionnaireError>,
    render: impl FnOnce(T, SessionView) -> Value,
) -> Response {
    let id = match parse_id(id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.apply(id, op).await {
        None => not_found(),
        Some((Ok(value), view)) => Json(render(value, view)).into_response(),
        Some((Err(e), _)) => questionnaire_error(&e),
    }
}

/// GET /api/questionnaire/questions
async fn list_questions(State(state): State<QuestionnaireRouteState>) -> impl IntoResponse {
    Json(json!({"questions": state.sessions.questions().as_ref()}))
}

/// POST /api/questionnaire
async fn create_session(State(state): State<QuestionnaireRouteState>) -> impl IntoResponse {
    let (id, session) = state.sessions.create().await;
    (
        StatusCode::CREATED,
        Json(json!({"id": id, "session": session})),
    )
}

/// GET /api/questionnaire/{id}
async fn get_session(
    State(state): State<QuestionnaireRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.view(id).await {
        Some(view) => Json(json!(view)).into_response(),
        None => not_found(),
    }
}

async fn start(State(state): State<QuestionnaireRouteState>, Path(id): Path<String>) -> Response {
    apply(&state, &id, |q| q.start(), |(), view| json!(view)).await
}

async fn set_value(
    State(state): State<QuestionnaireRouteState>,
    Path(id): Path<String>,
    Json(body): Json<PendingValue>,
) -> Response {
    apply(
        &state,
        &id,
        |q| q.set_pending_value(body.value),
        |(), view| json!(view),
    )
    .await
}

/// POST /api/questionnaire/{id}/advance
///
/// A rejected answer is a 200 with `outcome: "rejected"`; the session keeps
/// its position and carries the message as `last_error`.
async fn advance(State(state): State<QuestionnaireRouteState>, Path(id): Path<String>) -> Response {
    apply(
        &state,
        &id,
        |q| q.advance(),
        |outcome, view| match outcome {
            AdvanceOutcome::Rejected { message } => {
                json!({"outcome": "rejected", "message": message, "session": view})
            }
            AdvanceOutcome::Next { index } => {
                json!({"outcome": "next", "index": index, "session": view})
            }
            AdvanceOutcome::Completed => json!({"outcome": "completed", "session": view}),
        },
    )
    .await
}

async fn retreat(State(state): State<QuestionnaireRouteState>, Path(id): Path<String>) -> Response {
    apply(
        &state,
        &id,
        |q| q.retreat(),
        |outcome, view| match outcome {
            RetreatOutcome::Previous { index } => {
                json!({"outcome": "previous", "index": index, "session": view})
            }
            RetreatOutcome::NotStarted => json!({"outcome": "not_started", "session": view}),
        },
    )
    .await
}

async fn cancel(State(state): State<QuestionnaireRouteState>, Path(id): Path<String>) -> Response {
    apply(&state, &id, |q| q.cancel(), |(), view| json!(view)).await
}

/// POST /api/questionnaire/{id}/predict
///
/// Hands the completed answers to the oracle. The session is consumed on
/// success and on a failed prediction alike.
async fn predict(
    State(state): State<QuestionnaireRouteState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let answers = match state.sessions.take_completed(id).await {
        None => return not_found(),
        Some(Err(e)) => return questionnaire_error(&e),
        Some(Ok(answers)) => answers,
    };

    let result = match PredictionRequest::try_from(answers) {
        Ok(request) => state.app.predict(request, client_info(&headers)).await,
        Err(e) => Err(PredictionError::from(e)),
    };
    match result {
        Ok(prediction) => Json(json!(prediction)).into_response(),
        Err(e) => prediction_error_response(&e).into_response(),
    }
}

/// Build the questionnaire REST routes.
pub fn questionnaire_routes(state: QuestionnaireRouteState) -> Router {
    Router::new()
        .route("/api/questionnaire/questions", get(list_questions))
        .route("/api/questionnaire", post(create_session))
        .route("/api/questionnaire/{id}", get(get_session))
        .route("/api/questionnaire/{id}/start", post(start))
        .route("/api/questionnaire/{id}/value", post(set_value))
        .route("/api/questionnaire/{id}/advance", post(advance))
        .route("/api/questionnaire/{id}/retreat", post(retreat))
        .route("/api/questionnaire/{id}/cancel", post(cancel))
        .route("/api/questionnaire/{id}/predict", post(predict))
        .with_state(state)
}
