//! Direct messaging core. The submodules own persistence and policy; the
//! functions here compose them with real-time delivery. Delivery always runs
//! after the store has committed and its outcome never fails the operation.

pub mod blocking;
pub mod conversation;
pub mod read_state;
pub mod store;
pub mod users;

pub use conversation::{conversation_key, ConversationKey};

use chrono::SecondsFormat;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    AuthUser, ConversationsResponse, DeliveryOutcome, HistoryResponse, Message,
    SendMessageRequest,
};
use crate::ws::events::ServerEvent;
use crate::AppState;

/// Fixed-width UTC timestamp; lexical order equals chronological order.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn in_placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

/// Validates 1-based paging input against the configured limits.
pub fn resolve_page(config: &Config, page: Option<i64>, page_size: Option<i64>) -> AppResult<(i64, i64)> {
    let page = page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::Validation("Page must be at least 1".into()));
    }
    let page_size = alumni_dm_shared::validation::clamp_page_size(
        page_size,
        config.default_page_size,
        config.max_page_size,
    );
    Ok((page, page_size))
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: Message,
    pub delivery: DeliveryOutcome,
}

pub async fn send(state: &AppState, sender: &AuthUser, req: SendMessageRequest) -> AppResult<SentMessage> {
    store::validate_new_message(&sender.id, &req)?;
    blocking::ensure_can_send(&state.db, &sender.id, &req.recipient_id).await?;

    let message = store::insert_message(&state.db, &sender.id, &req).await?;
    let delivery = state.gateway.deliver(&message);

    tracing::debug!(
        message_id = %message.id,
        recipient_id = %message.recipient_id,
        ?delivery,
        "Message sent"
    );

    Ok(SentMessage { message, delivery })
}

/// Opening a conversation acknowledges it: everything the other participant
/// sent to the requester is marked read before the page is loaded.
pub async fn history(
    state: &AppState,
    requester: &AuthUser,
    other_user_id: &str,
    page: Option<i64>,
    page_size: Option<i64>,
) -> AppResult<HistoryResponse> {
    if other_user_id == requester.id {
        return Err(AppError::Validation("Cannot open a conversation with yourself".into()));
    }
    let (page, page_size) = resolve_page(&state.config, page, page_size)?;

    let other_user = users::find_user(&state.db, other_user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    acknowledge_conversation(state, requester, other_user_id).await?;

    let (messages, pagination) =
        store::history(&state.db, &requester.id, other_user_id, page, page_size).await?;

    Ok(HistoryResponse {
        messages,
        other_user,
        pagination,
    })
}

pub async fn mark_read(state: &AppState, requester: &AuthUser, message_id: &str) -> AppResult<Message> {
    let message = read_state::mark_read(&state.db, message_id, &requester.id).await?;
    state.gateway.deliver_read_receipt(&message);
    Ok(message)
}

/// Returns how many messages changed state. An unknown other participant is
/// `NotFound`, the same as for `history`.
pub async fn mark_conversation_read(
    state: &AppState,
    requester: &AuthUser,
    other_user_id: &str,
) -> AppResult<usize> {
    users::find_user(&state.db, other_user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    acknowledge_conversation(state, requester, other_user_id).await
}

async fn acknowledge_conversation(
    state: &AppState,
    requester: &AuthUser,
    other_user_id: &str,
) -> AppResult<usize> {
    let transition =
        read_state::mark_conversation_read(&state.db, &requester.id, other_user_id).await?;
    let count = transition.message_ids.len();

    if count > 0 {
        state.gateway.deliver_read_receipts(
            other_user_id,
            &requester.id,
            transition.conversation_key.as_str(),
            transition.message_ids,
            transition.read_at,
        );
    }

    Ok(count)
}

pub async fn soft_delete(state: &AppState, requester: &AuthUser, message_id: &str) -> AppResult<Message> {
    let message = store::soft_delete(&state.db, message_id, &requester.id).await?;

    let key = ConversationKey::new(&message.sender_id, &message.recipient_id);
    state.gateway.publish(
        &key,
        &ServerEvent::MessageDeleted {
            message_id: message.id.clone(),
            conversation_key: key.to_string(),
            deleted_by: requester.id.clone(),
            deleted_at: message.deleted_at.clone().unwrap_or_default(),
        },
        None,
    );

    Ok(message)
}

pub async fn edit(
    state: &AppState,
    requester: &AuthUser,
    message_id: &str,
    content: &str,
) -> AppResult<Message> {
    let message = store::edit(&state.db, message_id, &requester.id, content).await?;

    let key = ConversationKey::new(&message.sender_id, &message.recipient_id);
    state
        .gateway
        .publish(&key, &ServerEvent::MessageEdited { message: message.clone() }, None);

    Ok(message)
}

pub async fn react(
    state: &AppState,
    requester: &AuthUser,
    message_id: &str,
    emoji: Option<&str>,
) -> AppResult<Message> {
    let message = match emoji {
        Some(emoji) => store::react(&state.db, message_id, &requester.id, emoji).await?,
        None => store::unreact(&state.db, message_id, &requester.id).await?,
    };

    let key = ConversationKey::new(&message.sender_id, &message.recipient_id);
    state.gateway.publish(
        &key,
        &ServerEvent::ReactionUpdated {
            message_id: message.id.clone(),
            conversation_key: key.to_string(),
            user_id: requester.id.clone(),
            emoji: emoji.map(|e| e.trim().to_string()),
        },
        None,
    );

    Ok(message)
}

pub async fn list_conversations(
    state: &AppState,
    user: &AuthUser,
    page: Option<i64>,
    page_size: Option<i64>,
) -> AppResult<ConversationsResponse> {
    let (page, page_size) = resolve_page(&state.config, page, page_size)?;
    let (conversations, pagination) =
        conversation::list_conversations(&state.db, &user.id, page, page_size).await?;
    Ok(ConversationsResponse {
        conversations,
        pagination,
    })
}
