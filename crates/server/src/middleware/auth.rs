use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::AuthUser;
use crate::AppState;

pub const SESSION_COOKIE: &str = "session_token";

/// Pulls a session token from `Authorization: Bearer` or the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string());

    let cookie = headers
        .get("cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .split(';')
        .filter_map(|c| {
            c.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|t| t.to_string())
        })
        .next();

    bearer.or(cookie).filter(|t| !t.is_empty())
}

/// Resolves a session token to the identity that owns it.
pub async fn resolve_session(db: &SqlitePool, token: &str) -> AppResult<AuthUser> {
    let row = sqlx::query_as::<_, (String, String, String)>(
        r#"SELECT u.id, u.username, s.expires_at
           FROM "session" s
           JOIN "user" u ON u.id = s.user_id
           WHERE s.token = ?"#,
    )
    .bind(token)
    .fetch_optional(db)
    .await?;

    let (user_id, username, expires_at) = row.ok_or(AppError::Unauthorized)?;

    let expires_at = chrono::DateTime::parse_from_rfc3339(&expires_at)
        .map_err(|_| AppError::Unauthorized)?;
    if expires_at < chrono::Utc::now() {
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        id: user_id,
        username,
    })
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        resolve_session(&state.db, &token).await
    }
}
