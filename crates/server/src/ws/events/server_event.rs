use serde::Serialize;

use crate::models::{DeliveryOutcome, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

// ── Server → Client Events ──

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Pushed to the recipient of a freshly persisted message.
    NewMessage {
        message: Message,
        #[serde(rename = "conversationKey")]
        conversation_key: String,
    },
    /// Acknowledgement pushed to the sender's own connection.
    MessageSent {
        message: Message,
        #[serde(rename = "conversationKey")]
        conversation_key: String,
        delivery: DeliveryOutcome,
    },
    MessageRead {
        #[serde(rename = "conversationKey")]
        conversation_key: String,
        #[serde(rename = "readerId")]
        reader_id: String,
        #[serde(rename = "messageIds")]
        message_ids: Vec<String>,
        #[serde(rename = "readAt")]
        read_at: String,
    },
    MessageDeleted {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "conversationKey")]
        conversation_key: String,
        #[serde(rename = "deletedBy")]
        deleted_by: String,
        #[serde(rename = "deletedAt")]
        deleted_at: String,
    },
    MessageEdited {
        message: Message,
    },
    ReactionUpdated {
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "conversationKey")]
        conversation_key: String,
        #[serde(rename = "userId")]
        user_id: String,
        /// `None` when the reaction was removed.
        emoji: Option<String>,
    },
    Presence {
        #[serde(rename = "userId")]
        user_id: String,
        status: PresenceStatus,
    },
    UserTyping {
        #[serde(rename = "userId")]
        user_id: String,
        #[serde(rename = "conversationKey")]
        conversation_key: String,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },
    Error {
        message: String,
        code: String,
    },
}
