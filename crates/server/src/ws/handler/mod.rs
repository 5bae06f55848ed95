mod chat;
mod lifecycle;

use axum::{
    extract::{ws::{Message, WebSocket}, Query, State, WebSocketUpgrade},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::AppError;
use crate::messaging::ConversationKey;
use crate::middleware::auth::{resolve_session, token_from_headers};
use crate::models::AuthUser;
use crate::ws::events::ClientEvent;
use crate::ws::gateway::ClientId;
use crate::AppState;

/// WebSocket upgrade handler. The session is resolved before upgrading, so
/// an unauthenticated client gets a plain 401 instead of a socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let token = query
        .get("token")
        .filter(|t| !t.is_empty())
        .cloned()
        .or_else(|| token_from_headers(&headers));

    let user = match token {
        Some(token) => match resolve_session(&state.db, &token).await {
            Ok(user) => user,
            Err(e) => return e.into_response(),
        },
        None => return AppError::Unauthorized.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: AuthUser) {
    let client_id = state.gateway.next_client_id();
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    lifecycle::on_connect(&state, client_id, &user, tx);

    // Forward queued events to the socket and keep the link alive. The loop
    // ends when the registry drops our sender (replaced connection) or the
    // peer goes away.
    let heartbeat = state.config.heartbeat_interval();
    let mut send_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(heartbeat);
        ticker.tick().await;
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(msg) => {
                        if ws_tx.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    }
                },
                _ = ticker.tick() => {
                    if ws_tx.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Receive loop. Any inbound frame, pongs included, counts as liveness.
    let idle_timeout = state.config.idle_timeout();
    let state_clone = state.clone();
    let user_clone = user.clone();
    let mut recv_task = tokio::spawn(async move {
        loop {
            let msg = match tokio::time::timeout(idle_timeout, ws_rx.next()).await {
                Ok(Some(Ok(msg))) => msg,
                Ok(_) => break,
                Err(_) => {
                    tracing::info!(user_id = %user_clone.id, client_id, "Connection idle, closing");
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let text_str: &str = &text;
                    match serde_json::from_str::<ClientEvent>(text_str) {
                        Ok(event) => {
                            handle_client_event(&state_clone, client_id, &user_clone, event).await;
                        }
                        Err(e) => {
                            chat::reject(
                                &state_clone,
                                client_id,
                                &user_clone,
                                AppError::Validation(format!("Malformed event: {}", e)),
                            );
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    lifecycle::on_disconnect(&state, client_id, &user);
}

async fn handle_client_event(
    state: &AppState,
    client_id: ClientId,
    user: &AuthUser,
    event: ClientEvent,
) {
    match event {
        ClientEvent::SendMessage(req) => {
            chat::handle_send_message(state, client_id, user, req).await;
        }
        ClientEvent::MarkRead { message_id } => {
            chat::handle_mark_read(state, client_id, user, &message_id).await;
        }
        ClientEvent::TypingStart { recipient_id } => {
            chat::handle_typing(state, user, &recipient_id, true);
        }
        ClientEvent::TypingStop { recipient_id } => {
            chat::handle_typing(state, user, &recipient_id, false);
        }
        ClientEvent::JoinConversation { other_user_id } => {
            if other_user_id != user.id {
                let key = ConversationKey::new(&user.id, &other_user_id);
                state.gateway.subscribe(client_id, &user.id, key);
            }
        }
        ClientEvent::LeaveConversation { other_user_id } => {
            let key = ConversationKey::new(&user.id, &other_user_id);
            state.gateway.unsubscribe(client_id, &key);
        }
        ClientEvent::Ping => {}
    }
}
