use tokio::sync::mpsc;

use crate::models::AuthUser;
use crate::ws::events::{PresenceStatus, ServerEvent};
use crate::ws::gateway::{ClientId, ConnectedClient};
use crate::AppState;

/// Queues the current presence snapshot for the new connection, then maps
/// the identity to it. Anything already mapped for the identity is replaced.
pub fn on_connect(
    state: &AppState,
    client_id: ClientId,
    user: &AuthUser,
    tx: mpsc::UnboundedSender<String>,
) {
    for uid in state.gateway.online_users() {
        if uid == user.id {
            continue;
        }
        if let Ok(msg) = serde_json::to_string(&ServerEvent::Presence {
            user_id: uid,
            status: PresenceStatus::Online,
        }) {
            let _ = tx.send(msg);
        }
    }

    let client = ConnectedClient {
        client_id,
        user_id: user.id.clone(),
        username: user.username.clone(),
        tx,
    };
    tracing::info!(
        user_id = %client.user_id,
        username = %client.username,
        client_id,
        "Client connecting"
    );
    let replaced = state.gateway.on_connect(client);

    tracing::info!(
        user_id = %user.id,
        client_id,
        replaced = ?replaced,
        "Client connected"
    );
}

pub fn on_disconnect(state: &AppState, client_id: ClientId, user: &AuthUser) {
    let removed = state.gateway.on_disconnect(&user.id, client_id);
    tracing::info!(user_id = %user.id, client_id, removed, "Client disconnected");
}
