//! Message handlers inside a session.

use crate::dtos::{total_pages, ListParams, MessageListResponse, MessageResponse, SendMessageRequest};
use crate::handlers::sessions::find_member_session;
use crate::middleware::AuthUser;
use crate::models::ChatMessage;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(session_id): Path<String>,
    Json(payload): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let session = find_member_session(&state, &session_id, &identity.user_id).await?;

    if !session.is_active() {
        return Err(AppError::Conflict(anyhow::anyhow!("Session has ended")));
    }

    let message = ChatMessage::new(
        session.session_id.clone(),
        identity.user_id.clone(),
        payload.content,
    );
    state.store.insert_message(&message).await?;

    tracing::info!(
        session_id = %message.session_id,
        message_id = %message.message_id,
        "Message stored"
    );

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(session_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_member_session(&state, &session_id, &identity.user_id).await?;
    let (page, page_size) = params.normalized();

    let (messages, total) = state
        .store
        .list_messages(&session.session_id, page, page_size)
        .await?;

    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
        total,
        page,
        page_size,
        total_pages: total_pages(total, page_size),
    }))
}
