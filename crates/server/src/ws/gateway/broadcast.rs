use super::{ClientId, GatewayState};
use crate::messaging::ConversationKey;
use crate::ws::events::ServerEvent;

fn encode(event: &ServerEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!("Failed to encode event: {}", e);
            None
        }
    }
}

impl GatewayState {
    /// Pushes to the identity's current connection. Returns whether a live
    /// connection accepted the event.
    pub fn send_to_user(&self, user_id: &str, event: &ServerEvent) -> bool {
        let msg = match encode(event) {
            Some(m) => m,
            None => return false,
        };

        match self.presence.get(user_id) {
            Some(client) => client.tx.send(msg).is_ok(),
            None => false,
        }
    }

    /// Like `send_to_user`, but only if `client_id` is still the identity's
    /// mapped connection.
    pub fn send_to_client(&self, user_id: &str, client_id: ClientId, event: &ServerEvent) -> bool {
        let msg = match encode(event) {
            Some(m) => m,
            None => return false,
        };

        match self.presence.get(user_id) {
            Some(client) if client.client_id == client_id => client.tx.send(msg).is_ok(),
            _ => false,
        }
    }

    /// Best-effort fan-out to every connected identity. Returns the number
    /// of connections that accepted the event.
    pub fn broadcast_all(&self, event: &ServerEvent, exclude_user: Option<&str>) -> usize {
        let msg = match encode(event) {
            Some(m) => m,
            None => return 0,
        };

        let mut sent = 0;
        for client in self.presence.iter() {
            if Some(client.key().as_str()) == exclude_user {
                continue;
            }
            if client.tx.send(msg.clone()).is_ok() {
                sent += 1;
            }
        }
        sent
    }

    /// Pushes to every connection subscribed to the conversation topic.
    pub fn publish(&self, key: &ConversationKey, event: &ServerEvent, exclude: Option<ClientId>) -> usize {
        let msg = match encode(event) {
            Some(m) => m,
            None => return 0,
        };

        let mut sent = 0;
        for (client_id, user_id) in self.topics.subscribers(key) {
            if Some(client_id) == exclude {
                continue;
            }
            if let Some(client) = self.presence.get(&user_id) {
                if client.client_id == client_id && client.tx.send(msg.clone()).is_ok() {
                    sent += 1;
                }
            }
        }
        sent
    }
}
