pub mod blocks;
pub mod conversations;
pub mod messages;

use crate::ws;
use crate::AppState;
use axum::{routing::{get, post, put}, Router};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Messages
        .route("/messages", post(messages::send_message))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/messages/search", get(messages::search_messages))
        .route(
            "/messages/{id}",
            axum::routing::patch(messages::edit_message).delete(messages::delete_message),
        )
        .route("/messages/{id}/read", put(messages::mark_read))
        .route(
            "/messages/{id}/reactions",
            put(messages::add_reaction).delete(messages::remove_reaction),
        )
        // Conversations
        .route("/conversations", get(conversations::list_conversations))
        .route(
            "/conversations/{otherUserId}/messages",
            get(conversations::conversation_history),
        )
        .route(
            "/conversations/{otherUserId}/read",
            put(conversations::mark_conversation_read),
        )
        // Blocks
        .route("/blocks", get(blocks::list_blocks))
        .route(
            "/blocks/{userId}",
            post(blocks::block_user).delete(blocks::unblock_user),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/gateway", get(ws::handler::ws_handler))
        .with_state(state)
}
