//! Session handlers.

use alchemy_models::SessionId;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::error::Result;
use crate::state::AppState;
use crate::types::{
    CreateSessionRequest, EditComponentRequest, SendMessageRequest, SessionResponse,
};

/// POST /sessions - Start a session.
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let session = state.sessions.create(&req.description).await?;
    info!(session_id = %session.id, status = %session.status, "POST /sessions");
    Ok((StatusCode::CREATED, Json(SessionResponse::from(&session))))
}

/// POST /sessions/:id/messages - Answer follow-up questions.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SessionResponse>> {
    let id = SessionId::from(id);
    let session = state.sessions.send_message(&id, &req.message).await?;
    info!(session_id = %id, status = %session.status, "POST /sessions/:id/messages");
    Ok(Json(SessionResponse::from(&session)))
}

/// GET /sessions/:id - Inspect a session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>> {
    let session = state.sessions.get(&SessionId::from(id)).await?;
    Ok(Json(SessionResponse::from(&session)))
}

/// POST /sessions/:id/edit - Request changes to a finished component.
pub async fn edit_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<EditComponentRequest>,
) -> Result<Json<SessionResponse>> {
    let id = SessionId::from(id);
    let session = state.sessions.edit(&id, &req.feedback).await?;
    info!(session_id = %id, status = %session.status, "POST /sessions/:id/edit");
    Ok(Json(SessionResponse::from(&session)))
}
