use alumni_dm_server::{config::Config, routes, AppState};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio_tungstenite::tungstenite::Message;

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Start the test app on a random TCP port and return the base URL.
pub async fn start_server() -> (String, sqlx::SqlitePool) {
    start_server_with_config(super::test_config()).await
}

pub async fn start_server_with_config(config: Config) -> (String, sqlx::SqlitePool) {
    let (base, pool, _state) = start_server_with_state(config).await;
    (base, pool)
}

/// Like `start_server_with_config`, but also hands back the shared state so
/// tests can drive the messaging core alongside live sockets.
pub async fn start_server_with_state(config: Config) -> (String, sqlx::SqlitePool, Arc<AppState>) {
    let pool = super::setup_test_db().await;
    let state = super::create_test_state(pool.clone(), config);
    let app = routes::build_router(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://127.0.0.1:{}", addr.port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    (base, pool, state)
}

pub fn ws_url(base: &str, token: &str) -> String {
    format!("{}/gateway?token={}", base.replace("http://", "ws://"), token)
}

/// Connect a WebSocket with a session token.
pub async fn ws_connect(base: &str, token: &str) -> WsStream {
    let (ws, _) = tokio_tungstenite::connect_async(&ws_url(base, token))
        .await
        .unwrap();
    ws
}

/// Read the next text frame as JSON, skipping control frames, with timeout.
pub async fn recv_json(ws: &mut WsStream) -> Option<Value> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(3);
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => return serde_json::from_str(&text).ok(),
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
            _ => return None,
        }
    }
}

/// Read frames until one with the given `type` arrives.
pub async fn recv_event(ws: &mut WsStream, event_type: &str) -> Option<Value> {
    loop {
        let msg = recv_json(ws).await?;
        if msg["type"] == event_type {
            return Some(msg);
        }
    }
}

/// Drain all pending messages until timeout.
pub async fn drain_messages(ws: &mut WsStream) -> Vec<Value> {
    let mut messages = Vec::new();
    loop {
        let timeout =
            tokio::time::timeout(std::time::Duration::from_millis(200), ws.next()).await;
        match timeout {
            Ok(Some(Ok(Message::Text(text)))) => {
                if let Ok(v) = serde_json::from_str::<Value>(&text) {
                    messages.push(v);
                }
            }
            Ok(Some(Ok(_))) => continue,
            _ => break,
        }
    }
    messages
}

/// Send a JSON message over WebSocket.
pub async fn send_json(ws: &mut WsStream, value: &Value) {
    ws.send(Message::Text(serde_json::to_string(value).unwrap().into()))
        .await
        .unwrap();
}
