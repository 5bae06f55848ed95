mod server_event;

pub use server_event::{PresenceStatus, ServerEvent};

use serde::Deserialize;

use crate::models::SendMessageRequest;

// ── Client → Server Events ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage(SendMessageRequest),
    MarkRead {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    TypingStart {
        #[serde(rename = "recipientId")]
        recipient_id: String,
    },
    TypingStop {
        #[serde(rename = "recipientId")]
        recipient_id: String,
    },
    JoinConversation {
        #[serde(rename = "otherUserId")]
        other_user_id: String,
    },
    LeaveConversation {
        #[serde(rename = "otherUserId")]
        other_user_id: String,
    },
    Ping,
}
