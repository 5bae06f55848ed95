use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::error::AppResult;
use crate::messaging::blocking;
use crate::models::{AuthUser, BlockedUser};
use crate::AppState;

pub async fn list_blocks(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<Json<Vec<BlockedUser>>> {
    Ok(Json(blocking::blocked_users(&state.db, &user.id).await?))
}

pub async fn block_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(blocked_id): Path<String>,
) -> AppResult<StatusCode> {
    blocking::block(&state.db, &user.id, &blocked_id).await?;
    tracing::info!(blocker_id = %user.id, blocked_id = %blocked_id, "User blocked");
    Ok(StatusCode::NO_CONTENT)
}

/// Idempotent: unblocking someone who isn't blocked still succeeds.
pub async fn unblock_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(blocked_id): Path<String>,
) -> AppResult<StatusCode> {
    blocking::unblock(&state.db, &user.id, &blocked_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
