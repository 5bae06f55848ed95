use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::AppResult;
use crate::extract::Query;
use crate::messaging;
use crate::models::{AuthUser, Message, SearchQuery};
use crate::AppState;

/// GET /api/messages/search?q=...&userId=...
///
/// Results come newest first and never include deleted messages.
pub async fn search_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<Vec<Message>>> {
    let q = query.q.unwrap_or_default();
    let scope = query.user_id.as_deref().filter(|id| !id.is_empty());

    let results = messaging::store::search(&state.db, &user.id, q.trim(), scope).await?;
    Ok(Json(results))
}
