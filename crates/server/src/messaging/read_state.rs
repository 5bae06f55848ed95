use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::models::Message;

use super::{now_timestamp, store, ConversationKey};

/// Messages moved from unread to read by one bulk transition.
#[derive(Debug, Clone)]
pub struct ReadTransition {
    pub conversation_key: ConversationKey,
    pub message_ids: Vec<String>,
    pub read_at: String,
}

/// Marks one message read. Fails with `NotFound` unless the requester is the
/// recipient and the message is still unread, so a repeat call is
/// distinguishable from a successful one. Reads never revert.
pub async fn mark_read(db: &SqlitePool, message_id: &str, requester_id: &str) -> AppResult<Message> {
    let result = sqlx::query(
        "UPDATE messages SET is_read = 1, read_at = ?
         WHERE id = ? AND recipient_id = ? AND is_read = 0",
    )
    .bind(now_timestamp())
    .bind(message_id)
    .bind(requester_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    store::fetch_message(db, message_id).await?.ok_or(AppError::NotFound)
}

/// Marks everything `other_user_id` has sent to `user_id` as read.
pub async fn mark_conversation_read(
    db: &SqlitePool,
    user_id: &str,
    other_user_id: &str,
) -> AppResult<ReadTransition> {
    let read_at = now_timestamp();

    let message_ids = sqlx::query_scalar::<_, String>(
        "UPDATE messages SET is_read = 1, read_at = ?
         WHERE sender_id = ? AND recipient_id = ? AND is_read = 0
         RETURNING id",
    )
    .bind(&read_at)
    .bind(other_user_id)
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(ReadTransition {
        conversation_key: ConversationKey::new(user_id, other_user_id),
        message_ids,
        read_at,
    })
}
