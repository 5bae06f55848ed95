mod search;

pub use search::*;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::AppResult;
use crate::extract;
use crate::messaging;
use crate::models::{
    AuthUser, DeliveryOutcome, EditMessageRequest, Message, ReactionRequest, SendMessageRequest,
    UnreadCountResponse,
};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    #[serde(flatten)]
    message: Message,
    delivery: DeliveryOutcome,
}

/// POST /api/messages
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    extract::Json(body): extract::Json<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    let sent = messaging::send(&state, &user, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            message: sent.message,
            delivery: sent.delivery,
        }),
    ))
}

/// PATCH /api/messages/{id}
pub async fn edit_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    extract::Json(body): extract::Json<EditMessageRequest>,
) -> AppResult<Json<Message>> {
    let message = messaging::edit(&state, &user, &message_id, &body.content).await?;
    Ok(Json(message))
}

/// DELETE /api/messages/{id}
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> AppResult<StatusCode> {
    messaging::soft_delete(&state, &user, &message_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/messages/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> AppResult<Json<Message>> {
    let message = messaging::mark_read(&state, &user, &message_id).await?;
    Ok(Json(message))
}

/// PUT /api/messages/{id}/reactions
pub async fn add_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
    extract::Json(body): extract::Json<ReactionRequest>,
) -> AppResult<Json<Message>> {
    let message = messaging::react(&state, &user, &message_id, Some(&body.emoji)).await?;
    Ok(Json(message))
}

/// DELETE /api/messages/{id}/reactions
pub async fn remove_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<String>,
) -> AppResult<Json<Message>> {
    let message = messaging::react(&state, &user, &message_id, None).await?;
    Ok(Json(message))
}

/// GET /api/messages/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let count = messaging::store::unread_count(&state.db, &user.id).await?;
    Ok(Json(UnreadCountResponse { count }))
}
