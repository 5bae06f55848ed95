use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::error::AppResult;
use crate::extract::Query;
use crate::messaging;
use crate::models::{
    AuthUser, ConversationsResponse, HistoryResponse, MarkedReadResponse, PageQuery,
};
use crate::AppState;

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ConversationsResponse>> {
    let response =
        messaging::list_conversations(&state, &user, query.page, query.page_size).await?;
    Ok(Json(response))
}

/// GET /api/conversations/{otherUserId}/messages
///
/// Fetching history marks the other participant's messages as read.
pub async fn conversation_history(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(other_user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let response =
        messaging::history(&state, &user, &other_user_id, query.page, query.page_size).await?;
    Ok(Json(response))
}

/// PUT /api/conversations/{otherUserId}/read
pub async fn mark_conversation_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(other_user_id): Path<String>,
) -> AppResult<Json<MarkedReadResponse>> {
    let count = messaging::mark_conversation_read(&state, &user, &other_user_id).await?;
    Ok(Json(MarkedReadResponse { count }))
}
