//! Session CRUD handlers.

use crate::dtos::{
    total_pages, CreateSessionRequest, ListParams, SessionListResponse, SessionResponse,
    UpdateSessionRequest,
};
use crate::middleware::AuthUser;
use crate::models::ChatSession;
use crate::startup::AppState;
use crate::workflow::{WorkflowEvent, EVENT_SESSION_ENDED};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn create_session(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut participant_ids = payload.participant_ids;
    participant_ids.retain(|p| p != &identity.user_id);
    participant_ids.dedup();

    let session = ChatSession::new(identity.user_id.clone(), payload.title, participant_ids);
    state.store.insert_session(&session).await?;

    tracing::info!(
        session_id = %session.session_id,
        owner_id = %session.owner_id,
        "Session created"
    );

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

pub async fn list_sessions(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (page, page_size) = params.normalized();

    let (sessions, total) = state
        .store
        .list_sessions(&identity.user_id, page, page_size)
        .await?;

    Ok(Json(SessionListResponse {
        sessions: sessions.into_iter().map(SessionResponse::from).collect(),
        total,
        page,
        page_size,
        total_pages: total_pages(total, page_size),
    }))
}

/// Fetch a session the caller is a member of.
pub async fn get_session(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_member_session(&state, &session_id, &identity.user_id).await?;
    Ok(Json(SessionResponse::from(session)))
}

pub async fn update_session(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(session_id): Path<String>,
    Json(payload): Json<UpdateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = find_owned_session(&state, &session_id, &identity.user_id).await?;

    let updated = state
        .store
        .update_session_title(&session.session_id, &payload.title)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    Ok(Json(SessionResponse::from(updated)))
}

pub async fn end_session(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_owned_session(&state, &session_id, &identity.user_id).await?;

    if !session.is_active() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Session has already ended"
        )));
    }

    let ended = state
        .store
        .end_session(&session.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    // Message purging is handled by the workflow engine; delivery failures
    // must not fail the request.
    let event = WorkflowEvent::new(
        EVENT_SESSION_ENDED,
        serde_json::json!({ "session_id": ended.session_id }),
    );
    if let Err(e) = state.workflow.send_event(&event).await {
        tracing::warn!(session_id = %ended.session_id, "Failed to emit session.ended event: {}", e);
    }

    tracing::info!(session_id = %ended.session_id, "Session ended");

    Ok(Json(SessionResponse::from(ended)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_owned_session(&state, &session_id, &identity.user_id).await?;

    state.store.delete_session(&session.session_id).await?;
    let purged = state
        .store
        .delete_session_messages(&session.session_id)
        .await?;

    tracing::info!(
        session_id = %session.session_id,
        purged,
        "Session deleted"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Session lookup for read/post access: 404 unknown, 403 non-member.
pub(crate) async fn find_member_session(
    state: &AppState,
    session_id: &str,
    user_id: &str,
) -> Result<ChatSession, AppError> {
    let session = state
        .store
        .find_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    if !session.is_member(user_id) {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Not a member of this session"
        )));
    }

    Ok(session)
}

/// Session lookup for mutating access: owner only.
async fn find_owned_session(
    state: &AppState,
    session_id: &str,
    user_id: &str,
) -> Result<ChatSession, AppError> {
    let session = state
        .store
        .find_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Session not found")))?;

    if session.owner_id != user_id {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "Only the session owner may do this"
        )));
    }

    Ok(session)
}
