use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::BlockedUser;

/// Whether `sender` may message `recipient` right now. Reads the
/// collaborator-owned preference and block list on every call; nothing is
/// cached across requests.
///
/// Fails with `NotFound` if the recipient is unknown.
pub async fn can_send(db: &SqlitePool, sender_id: &str, recipient_id: &str) -> AppResult<bool> {
    let accepts = sqlx::query_scalar::<_, bool>(
        r#"SELECT accepts_messages FROM "user" WHERE id = ?"#,
    )
    .bind(recipient_id)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound)?;

    if !accepts {
        return Ok(false);
    }

    // A block in either direction closes the pair.
    let blocks = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM user_blocks
         WHERE (blocker_id = ? AND blocked_id = ?) OR (blocker_id = ? AND blocked_id = ?)",
    )
    .bind(recipient_id)
    .bind(sender_id)
    .bind(sender_id)
    .bind(recipient_id)
    .fetch_one(db)
    .await?;

    Ok(blocks == 0)
}

pub async fn ensure_can_send(db: &SqlitePool, sender_id: &str, recipient_id: &str) -> AppResult<()> {
    if can_send(db, sender_id, recipient_id).await? {
        Ok(())
    } else {
        tracing::debug!(sender_id, recipient_id, "Send rejected by blocking gate");
        Err(AppError::Blocked)
    }
}

pub async fn block(db: &SqlitePool, blocker_id: &str, blocked_id: &str) -> AppResult<()> {
    if blocker_id == blocked_id {
        return Err(AppError::Validation("Cannot block yourself".into()));
    }

    let exists = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM "user" WHERE id = ?"#)
        .bind(blocked_id)
        .fetch_one(db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound);
    }

    sqlx::query(
        "INSERT OR IGNORE INTO user_blocks (blocker_id, blocked_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(blocker_id)
    .bind(blocked_id)
    .bind(super::now_timestamp())
    .execute(db)
    .await?;

    Ok(())
}

pub async fn unblock(db: &SqlitePool, blocker_id: &str, blocked_id: &str) -> AppResult<()> {
    sqlx::query("DELETE FROM user_blocks WHERE blocker_id = ? AND blocked_id = ?")
        .bind(blocker_id)
        .bind(blocked_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn blocked_users(db: &SqlitePool, user_id: &str) -> AppResult<Vec<BlockedUser>> {
    let users = sqlx::query_as::<_, BlockedUser>(
        r#"SELECT u.id, u.username, u.image, b.created_at AS blocked_at
           FROM user_blocks b
           JOIN "user" u ON u.id = b.blocked_id
           WHERE b.blocker_id = ?
           ORDER BY b.created_at DESC"#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(users)
}
