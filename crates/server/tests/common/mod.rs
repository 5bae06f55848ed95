#![allow(dead_code)]

pub mod ws_helpers;

use alumni_dm_server::{config::Config, db, routes, AppState};
use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    db::apply_schema(&pool).await.unwrap();

    pool
}

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_path: ":memory:".into(),
        default_page_size: 50,
        max_page_size: 100,
        ws_heartbeat_interval_secs: 30,
        ws_idle_timeout_secs: 75,
    }
}

pub fn create_test_state(pool: SqlitePool, config: Config) -> Arc<AppState> {
    Arc::new(AppState::new(pool, config))
}

/// Build a test Axum app with the given pool.
pub fn create_test_app(pool: SqlitePool) -> Router {
    routes::build_router(create_test_state(pool, test_config()))
}

pub fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

/// Create a test user directly in the database. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, username: &str) -> (String, String) {
    create_test_user_with_id(pool, &uuid::Uuid::new_v4().to_string(), username).await
}

/// Like `create_test_user`, with a caller-chosen id.
pub async fn create_test_user_with_id(
    pool: &SqlitePool,
    id: &str,
    username: &str,
) -> (String, String) {
    let user_id = id.to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(r#"INSERT INTO "user" (id, username, created_at) VALUES (?, ?, ?)"#)
        .bind(&user_id)
        .bind(username)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

    let session_token = uuid::Uuid::new_v4().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();

    sqlx::query(
        r#"INSERT INTO "session" (id, user_id, token, expires_at, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user_id)
    .bind(&session_token)
    .bind(&expires_at)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap();

    (user_id, session_token)
}

/// Insert an already-expired session for `user_id`. Returns its token.
pub async fn create_expired_session(pool: &SqlitePool, user_id: &str) -> String {
    let token = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now();
    sqlx::query(
        r#"INSERT INTO "session" (id, user_id, token, expires_at, created_at)
           VALUES (?, ?, ?, ?, ?)"#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(&token)
    .bind((now - chrono::Duration::hours(1)).to_rfc3339())
    .bind(now.to_rfc3339())
    .execute(pool)
    .await
    .unwrap();
    token
}

pub async fn block(pool: &SqlitePool, blocker_id: &str, blocked_id: &str) {
    sqlx::query("INSERT INTO user_blocks (blocker_id, blocked_id, created_at) VALUES (?, ?, ?)")
        .bind(blocker_id)
        .bind(blocked_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .unwrap();
}

pub async fn set_accepts_messages(pool: &SqlitePool, user_id: &str, accepts: bool) {
    sqlx::query(r#"UPDATE "user" SET accepts_messages = ? WHERE id = ?"#)
        .bind(accepts)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}
