use alumni_dm_shared::{constants::SEARCH_RESULT_LIMIT, validation};
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{
    Attachment, AttachmentInput, EditEntry, Message, MessageKind, MessageRow, Pagination,
    Reaction, SendMessageRequest,
};

use super::{in_placeholders, now_timestamp, ConversationKey};

/// Checks everything about a send that can be decided without the store.
pub fn validate_new_message(sender_id: &str, req: &SendMessageRequest) -> AppResult<()> {
    if req.recipient_id.trim().is_empty() {
        return Err(AppError::Validation("Recipient is required".into()));
    }
    if req.recipient_id == sender_id {
        return Err(AppError::Validation("Cannot send a message to yourself".into()));
    }

    validation::validate_attachment_count(req.attachments.len())?;
    for attachment in &req.attachments {
        validate_attachment(attachment)?;
    }

    match req.kind {
        MessageKind::Text => {
            validation::validate_message_content(&req.content, true)?;
            if req.payload.is_some() {
                return Err(AppError::Validation(
                    "Text messages do not carry a payload".into(),
                ));
            }
        }
        MessageKind::Image | MessageKind::File => {
            validation::validate_message_content(&req.content, false)?;
            if req.attachments.is_empty() {
                return Err(AppError::Validation(format!(
                    "A {} message needs at least one attachment",
                    req.kind.as_str()
                )));
            }
            if req.kind == MessageKind::Image
                && !req.attachments.iter().all(|a| a.mime_type.starts_with("image/"))
            {
                return Err(AppError::Validation(
                    "Image messages only carry image attachments".into(),
                ));
            }
        }
        MessageKind::Link => {
            validation::validate_message_content(&req.content, false)?;
            let url = req
                .payload
                .as_ref()
                .and_then(|p| p.get("url"))
                .and_then(|u| u.as_str())
                .ok_or_else(|| {
                    AppError::Validation("Link messages need a payload with a url".into())
                })?;
            parse_web_url(url)?;
        }
    }

    Ok(())
}

fn validate_attachment(attachment: &AttachmentInput) -> AppResult<()> {
    validation::validate_attachment_meta(&attachment.name, attachment.size, &attachment.mime_type)?;
    parse_web_url(&attachment.url)?;
    Ok(())
}

fn parse_web_url(raw: &str) -> AppResult<url::Url> {
    let parsed = url::Url::parse(raw)
        .map_err(|_| AppError::Validation(format!("Invalid url: {}", raw)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(AppError::Validation("Only http(s) urls are accepted".into())),
    }
}

/// Persists a validated message. The creation timestamp never precedes the
/// newest message already in the conversation.
pub async fn insert_message(
    db: &SqlitePool,
    sender_id: &str,
    req: &SendMessageRequest,
) -> AppResult<Message> {
    let key = ConversationKey::new(sender_id, &req.recipient_id);

    if let Some(reply_to) = &req.reply_to_id {
        let target = sqlx::query_scalar::<_, String>(
            "SELECT id FROM messages WHERE id = ? AND conversation_key = ?",
        )
        .bind(reply_to)
        .bind(key.as_str())
        .fetch_optional(db)
        .await?;
        if target.is_none() {
            return Err(AppError::NotFound);
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = now_timestamp();
    let payload = req.payload.as_ref().map(|p| p.to_string());

    let mut tx = db.begin().await?;

    sqlx::query(
        r#"INSERT INTO messages
               (id, sender_id, recipient_id, conversation_key, kind, content, payload, reply_to_id, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?,
               MAX(?, COALESCE((SELECT MAX(created_at) FROM messages WHERE conversation_key = ?), '')))"#,
    )
    .bind(&id)
    .bind(sender_id)
    .bind(&req.recipient_id)
    .bind(key.as_str())
    .bind(req.kind.as_str())
    .bind(&req.content)
    .bind(&payload)
    .bind(&req.reply_to_id)
    .bind(&now)
    .bind(key.as_str())
    .execute(&mut *tx)
    .await?;

    for (position, attachment) in req.attachments.iter().enumerate() {
        sqlx::query(
            "INSERT INTO message_attachments (id, message_id, position, name, url, size, mime_type)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&id)
        .bind(position as i64)
        .bind(attachment.name.trim())
        .bind(&attachment.url)
        .bind(attachment.size)
        .bind(&attachment.mime_type)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(message_id = %id, conversation = %key, "Message persisted");

    fetch_message(db, &id).await?.ok_or(AppError::NotFound)
}

pub async fn fetch_row(db: &SqlitePool, message_id: &str) -> AppResult<Option<MessageRow>> {
    let row = sqlx::query_as::<_, MessageRow>("SELECT * FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

pub async fn fetch_message(db: &SqlitePool, message_id: &str) -> AppResult<Option<Message>> {
    match fetch_row(db, message_id).await? {
        Some(row) => Ok(hydrate(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Matches rows exchanged between exactly two users; binds `a, b, b, a`.
const PAIR_FILTER: &str = "((sender_id = ? AND recipient_id = ?) OR (sender_id = ? AND recipient_id = ?))";

/// One page of a conversation. Pages are counted from the newest message;
/// each page is returned oldest-first for display.
pub async fn history(
    db: &SqlitePool,
    user_a: &str,
    user_b: &str,
    page: i64,
    page_size: i64,
) -> AppResult<(Vec<Message>, Pagination)> {
    let key = ConversationKey::new(user_a, user_b);

    let total = sqlx::query_scalar::<_, i64>(
        &format!("SELECT COUNT(*) FROM messages WHERE conversation_key = ? AND {}", PAIR_FILTER),
    )
    .bind(key.as_str())
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .fetch_one(db)
    .await?;

    let mut rows = sqlx::query_as::<_, MessageRow>(&format!(
        "SELECT * FROM messages WHERE conversation_key = ? AND {}
         ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        PAIR_FILTER
    ))
    .bind(key.as_str())
    .bind(user_a)
    .bind(user_b)
    .bind(user_b)
    .bind(user_a)
    .bind(page_size)
    .bind(Pagination::offset(page, page_size))
    .fetch_all(db)
    .await?;
    rows.reverse();

    let messages = hydrate(db, rows).await?;
    Ok((messages, Pagination::new(page, page_size, total)))
}

/// Tombstones a message. Only the sender may delete, and only once.
pub async fn soft_delete(db: &SqlitePool, message_id: &str, requester_id: &str) -> AppResult<Message> {
    let result = sqlx::query(
        "UPDATE messages SET is_deleted = 1, deleted_at = ?, deleted_by = ?
         WHERE id = ? AND sender_id = ? AND is_deleted = 0",
    )
    .bind(now_timestamp())
    .bind(requester_id)
    .bind(message_id)
    .bind(requester_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    fetch_message(db, message_id).await?.ok_or(AppError::NotFound)
}

/// Case-insensitive match of every whitespace-separated term of `query`,
/// restricted to the requester's conversations (or to one of them).
pub async fn search(
    db: &SqlitePool,
    requester_id: &str,
    query: &str,
    scope_user_id: Option<&str>,
) -> AppResult<Vec<Message>> {
    validation::validate_search_query(query)?;

    let terms: Vec<String> = query
        .split_whitespace()
        .map(|t| format!("%{}%", escape_like(t)))
        .collect();

    let mut sql = String::from(
        "SELECT * FROM messages WHERE (sender_id = ? OR recipient_id = ?) AND is_deleted = 0",
    );
    for _ in &terms {
        sql.push_str(" AND content LIKE ? ESCAPE '\\'");
    }
    if scope_user_id.is_some() {
        sql.push_str(" AND conversation_key = ? AND ");
        sql.push_str(PAIR_FILTER);
    }
    sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ?");

    let mut q = sqlx::query_as::<_, MessageRow>(&sql)
        .bind(requester_id)
        .bind(requester_id);
    for term in &terms {
        q = q.bind(term);
    }
    if let Some(scope) = scope_user_id {
        q = q
            .bind(ConversationKey::new(requester_id, scope).into_string())
            .bind(requester_id)
            .bind(scope)
            .bind(scope)
            .bind(requester_id);
    }
    let rows = q.bind(SEARCH_RESULT_LIMIT).fetch_all(db).await?;

    hydrate(db, rows).await
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub async fn unread_count(db: &SqlitePool, user_id: &str) -> AppResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages WHERE recipient_id = ? AND is_read = 0 AND is_deleted = 0",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;
    Ok(count)
}

/// Replaces a message's content, recording the prior content in its
/// append-only edit history. Sender only; deleted messages cannot be edited.
pub async fn edit(
    db: &SqlitePool,
    message_id: &str,
    editor_id: &str,
    content: &str,
) -> AppResult<Message> {
    let row = fetch_row(db, message_id)
        .await?
        .filter(|r| r.sender_id == editor_id && !r.is_deleted)
        .ok_or(AppError::NotFound)?;

    let kind = MessageKind::parse(&row.kind).unwrap_or_default();
    validation::validate_message_content(content, kind == MessageKind::Text)?;

    if row.content == content {
        return fetch_message(db, message_id).await?.ok_or(AppError::NotFound);
    }

    let mut tx = db.begin().await?;

    // Snapshot the content being replaced inside the write transaction.
    let recorded = sqlx::query(
        "INSERT INTO message_edits (id, message_id, previous_content, edited_at)
         SELECT ?, id, content,
                MAX(?, COALESCE((SELECT MAX(edited_at) FROM message_edits WHERE message_id = ?), ''))
         FROM messages WHERE id = ? AND sender_id = ? AND is_deleted = 0",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(now_timestamp())
    .bind(message_id)
    .bind(message_id)
    .bind(editor_id)
    .execute(&mut *tx)
    .await?;

    if recorded.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    sqlx::query("UPDATE messages SET content = ?, is_edited = 1 WHERE id = ?")
        .bind(content)
        .bind(message_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    fetch_message(db, message_id).await?.ok_or(AppError::NotFound)
}

async fn participant_row(db: &SqlitePool, message_id: &str, user_id: &str) -> AppResult<MessageRow> {
    fetch_row(db, message_id)
        .await?
        .filter(|r| !r.is_deleted && (r.sender_id == user_id || r.recipient_id == user_id))
        .ok_or(AppError::NotFound)
}

/// Sets the user's reaction, replacing any earlier one they left.
pub async fn react(db: &SqlitePool, message_id: &str, user_id: &str, emoji: &str) -> AppResult<Message> {
    validation::validate_reaction(emoji)?;
    participant_row(db, message_id, user_id).await?;

    sqlx::query(
        "INSERT INTO message_reactions (message_id, user_id, emoji, created_at) VALUES (?, ?, ?, ?)
         ON CONFLICT(message_id, user_id) DO UPDATE SET emoji = excluded.emoji, created_at = excluded.created_at",
    )
    .bind(message_id)
    .bind(user_id)
    .bind(emoji.trim())
    .bind(now_timestamp())
    .execute(db)
    .await?;

    fetch_message(db, message_id).await?.ok_or(AppError::NotFound)
}

pub async fn unreact(db: &SqlitePool, message_id: &str, user_id: &str) -> AppResult<Message> {
    participant_row(db, message_id, user_id).await?;

    let result = sqlx::query("DELETE FROM message_reactions WHERE message_id = ? AND user_id = ?")
        .bind(message_id)
        .bind(user_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    fetch_message(db, message_id).await?.ok_or(AppError::NotFound)
}

/// Loads attachments, edit history and reactions for a batch of rows and
/// builds the outward-facing messages. Deleted messages come back redacted:
/// flags and timestamps intact, content and payload gone.
pub async fn hydrate(db: &SqlitePool, rows: Vec<MessageRow>) -> AppResult<Vec<Message>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let in_clause = in_placeholders(ids.len());

    let sql = format!(
        "SELECT message_id, name, url, size, mime_type FROM message_attachments
         WHERE message_id IN ({}) ORDER BY position",
        in_clause
    );
    let mut query = sqlx::query_as::<_, Attachment>(&sql);
    for id in &ids {
        query = query.bind(id);
    }
    let mut attachments = group_by_message(query.fetch_all(db).await?, |a| &a.message_id);

    let sql = format!(
        "SELECT message_id, previous_content, edited_at FROM message_edits
         WHERE message_id IN ({}) ORDER BY edited_at, rowid",
        in_clause
    );
    let mut query = sqlx::query_as::<_, EditEntry>(&sql);
    for id in &ids {
        query = query.bind(id);
    }
    let mut edits = group_by_message(query.fetch_all(db).await?, |e| &e.message_id);

    let sql = format!(
        "SELECT message_id, user_id, emoji, created_at FROM message_reactions
         WHERE message_id IN ({}) ORDER BY created_at",
        in_clause
    );
    let mut query = sqlx::query_as::<_, Reaction>(&sql);
    for id in &ids {
        query = query.bind(id);
    }
    let mut reactions = group_by_message(query.fetch_all(db).await?, |r| &r.message_id);

    let messages = rows
        .into_iter()
        .map(|row| {
            let kind = MessageKind::parse(&row.kind).unwrap_or_else(|| {
                tracing::warn!(message_id = %row.id, kind = %row.kind, "Unknown message kind");
                MessageKind::Text
            });
            let attachments = attachments.remove(&row.id).unwrap_or_default();
            let edit_history = edits.remove(&row.id).unwrap_or_default();
            let reactions = reactions.remove(&row.id).unwrap_or_default();
            let payload = row
                .payload
                .as_deref()
                .and_then(|p| serde_json::from_str(p).ok());

            let mut message = Message {
                id: row.id,
                sender_id: row.sender_id,
                recipient_id: row.recipient_id,
                conversation_key: row.conversation_key,
                kind,
                content: row.content,
                payload,
                attachments,
                reply_to_id: row.reply_to_id,
                is_read: row.is_read,
                read_at: row.read_at,
                is_deleted: row.is_deleted,
                deleted_at: row.deleted_at,
                deleted_by: row.deleted_by,
                is_edited: row.is_edited,
                edit_history,
                reactions,
                created_at: row.created_at,
            };

            if message.is_deleted {
                message.content.clear();
                message.payload = None;
                message.attachments.clear();
                message.edit_history.clear();
            }

            message
        })
        .collect();

    Ok(messages)
}

fn group_by_message<T>(items: Vec<T>, key: impl Fn(&T) -> &String) -> HashMap<String, Vec<T>> {
    let mut map: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        map.entry(key(&item).clone()).or_default().push(item);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(recipient: &str, content: &str) -> SendMessageRequest {
        SendMessageRequest {
            recipient_id: recipient.into(),
            content: content.into(),
            kind: MessageKind::Text,
            payload: None,
            attachments: Vec::new(),
            reply_to_id: None,
        }
    }

    fn attachment(mime: &str) -> AttachmentInput {
        AttachmentInput {
            name: "photo".into(),
            url: "https://cdn.example.com/photo".into(),
            size: 42,
            mime_type: mime.into(),
        }
    }

    #[test]
    fn rejects_self_message() {
        assert!(matches!(
            validate_new_message("u1", &text("u1", "hi")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn image_needs_image_attachment() {
        let mut req = text("u2", "");
        req.kind = MessageKind::Image;
        assert!(validate_new_message("u1", &req).is_err());

        req.attachments.push(attachment("application/pdf"));
        assert!(validate_new_message("u1", &req).is_err());

        req.attachments = vec![attachment("image/png")];
        assert!(validate_new_message("u1", &req).is_ok());
    }

    #[test]
    fn link_needs_http_url_payload() {
        let mut req = text("u2", "look");
        req.kind = MessageKind::Link;
        assert!(validate_new_message("u1", &req).is_err());

        req.payload = Some(serde_json::json!({"url": "ftp://example.com"}));
        assert!(validate_new_message("u1", &req).is_err());

        req.payload = Some(serde_json::json!({"url": "https://example.com/event"}));
        assert!(validate_new_message("u1", &req).is_ok());
    }

    #[test]
    fn text_rejects_payload() {
        let mut req = text("u2", "hi");
        req.payload = Some(serde_json::json!({"url": "https://example.com"}));
        assert!(validate_new_message("u1", &req).is_err());
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
