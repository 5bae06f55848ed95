use super::GatewayState;
use crate::messaging::ConversationKey;
use crate::models::{DeliveryOutcome, Message};
use crate::ws::events::ServerEvent;

impl GatewayState {
    /// Bridges a persisted message to live connections: `new_message` to the
    /// recipient if connected, then a `message_sent` acknowledgement to the
    /// sender's own connection if any.
    pub fn deliver(&self, message: &Message) -> DeliveryOutcome {
        let conversation_key = message.conversation_key.clone();

        let pushed = self.send_to_user(
            &message.recipient_id,
            &ServerEvent::NewMessage {
                message: message.clone(),
                conversation_key: conversation_key.clone(),
            },
        );
        let delivery = if pushed {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Queued
        };

        self.send_to_user(
            &message.sender_id,
            &ServerEvent::MessageSent {
                message: message.clone(),
                conversation_key,
                delivery,
            },
        );

        delivery
    }

    /// Tells the sender their message was read. No-op for unread messages or
    /// an offline sender.
    pub fn deliver_read_receipt(&self, message: &Message) -> bool {
        match &message.read_at {
            Some(read_at) if message.is_read => self.deliver_read_receipts(
                &message.sender_id,
                &message.recipient_id,
                &message.conversation_key,
                vec![message.id.clone()],
                read_at.clone(),
            ),
            _ => false,
        }
    }

    pub fn deliver_read_receipts(
        &self,
        sender_id: &str,
        reader_id: &str,
        conversation_key: &str,
        message_ids: Vec<String>,
        read_at: String,
    ) -> bool {
        let pushed = self.send_to_user(
            sender_id,
            &ServerEvent::MessageRead {
                conversation_key: conversation_key.to_string(),
                reader_id: reader_id.to_string(),
                message_ids,
                read_at,
            },
        );
        if !pushed {
            tracing::debug!(sender_id, "Read receipt not pushed, sender offline");
        }
        pushed
    }

    /// Fire-and-forget; nothing is persisted or retried.
    pub fn relay_typing_indicator(&self, from: &str, to: &str, is_typing: bool) -> bool {
        self.send_to_user(
            to,
            &ServerEvent::UserTyping {
                user_id: from.to_string(),
                conversation_key: ConversationKey::new(from, to).into_string(),
                is_typing,
            },
        )
    }
}
