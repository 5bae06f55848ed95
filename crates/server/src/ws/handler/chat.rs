use crate::error::AppError;
use crate::messaging;
use crate::models::{AuthUser, SendMessageRequest};
use crate::ws::events::ServerEvent;
use crate::ws::gateway::ClientId;
use crate::AppState;

/// Reports a failed operation back to the connection that issued it.
pub fn reject(state: &AppState, client_id: ClientId, user: &AuthUser, err: AppError) {
    if let AppError::Database(ref e) = err {
        tracing::error!("Database failure on socket event: {:?}", e);
    }
    state.gateway.send_to_client(
        &user.id,
        client_id,
        &ServerEvent::Error {
            message: err.public_message(),
            code: err.code().to_string(),
        },
    );
}

/// The acknowledgement travels through the gateway as `message_sent`.
pub async fn handle_send_message(
    state: &AppState,
    client_id: ClientId,
    user: &AuthUser,
    req: SendMessageRequest,
) {
    if let Err(e) = messaging::send(state, user, req).await {
        reject(state, client_id, user, e);
    }
}

pub async fn handle_mark_read(state: &AppState, client_id: ClientId, user: &AuthUser, message_id: &str) {
    if let Err(e) = messaging::mark_read(state, user, message_id).await {
        reject(state, client_id, user, e);
    }
}

pub fn handle_typing(state: &AppState, user: &AuthUser, recipient_id: &str, is_typing: bool) {
    if recipient_id == user.id {
        return;
    }
    state
        .gateway
        .relay_typing_indicator(&user.id, recipient_id, is_typing);
}
