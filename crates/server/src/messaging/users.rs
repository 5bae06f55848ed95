//! Read-only lookups against the identity collaborator's user table.

use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::error::AppResult;
use crate::models::UserSummary;

use super::in_placeholders;

pub async fn find_user(db: &SqlitePool, user_id: &str) -> AppResult<Option<UserSummary>> {
    let user = sqlx::query_as::<_, UserSummary>(
        r#"SELECT id, username, image FROM "user" WHERE id = ?"#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn user_summaries(
    db: &SqlitePool,
    ids: &[String],
) -> AppResult<HashMap<String, UserSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        r#"SELECT id, username, image FROM "user" WHERE id IN ({})"#,
        in_placeholders(ids.len())
    );
    let mut query = sqlx::query_as::<_, UserSummary>(&sql);
    for id in ids {
        query = query.bind(id);
    }

    let users = query.fetch_all(db).await?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
}
