mod broadcast;
mod delivery;
mod topics;

pub use topics::Topics;

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use crate::messaging::ConversationKey;
use crate::ws::events::{PresenceStatus, ServerEvent};

pub type ClientId = u64;

pub struct ConnectedClient {
    pub client_id: ClientId,
    pub user_id: String,
    pub username: String,
    pub tx: mpsc::UnboundedSender<String>,
}

/// Process-wide presence registry: at most one live connection per identity.
///
/// Entries live in a sharded map, so connect/disconnect for one identity is
/// serialized on that key's shard while other identities proceed in
/// parallel. No guard is ever held across an await point.
pub struct GatewayState {
    next_id: AtomicU64,
    presence: DashMap<String, ConnectedClient>,
    topics: Topics,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayState {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            presence: DashMap::new(),
            topics: Topics::default(),
        }
    }

    pub fn next_client_id(&self) -> ClientId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Maps the identity to this connection, returning the connection it
    /// displaced. The displaced handle is dropped without notification; its
    /// outbound channel closes, which ends that socket.
    pub fn connect(&self, client: ConnectedClient) -> Option<ConnectedClient> {
        let client_id = client.client_id;
        let replaced = self.presence.insert(client.user_id.clone(), client);

        if let Some(ref old) = replaced {
            self.topics.drop_client(old.client_id);
            tracing::info!(
                user_id = %old.user_id,
                username = %old.username,
                stale_client = old.client_id,
                client_id,
                "Replaced stale connection"
            );
        }

        replaced
    }

    /// Removes the mapping only if it still points at `client_id`, so a late
    /// disconnect from a replaced socket can't evict its successor.
    pub fn disconnect(&self, user_id: &str, client_id: ClientId) -> bool {
        self.topics.drop_client(client_id);
        self.presence
            .remove_if(user_id, |_, c| c.client_id == client_id)
            .is_some()
    }

    /// Registers the connection and tells everyone else the identity is
    /// online. Broadcast is best-effort and never retried.
    pub fn on_connect(&self, client: ConnectedClient) -> Option<ClientId> {
        let user_id = client.user_id.clone();
        let replaced = self.connect(client).map(|old| old.client_id);

        self.broadcast_all(
            &ServerEvent::Presence {
                user_id: user_id.clone(),
                status: PresenceStatus::Online,
            },
            Some(&user_id),
        );

        replaced
    }

    /// Returns whether the mapping was removed. `offline` is only announced
    /// when it was; a stale socket closing says nothing about the identity.
    pub fn on_disconnect(&self, user_id: &str, client_id: ClientId) -> bool {
        let removed = self.disconnect(user_id, client_id);
        if removed {
            self.broadcast_all(
                &ServerEvent::Presence {
                    user_id: user_id.to_string(),
                    status: PresenceStatus::Offline,
                },
                Some(user_id),
            );
        }
        removed
    }

    pub fn is_online(&self, user_id: &str) -> bool {
        self.presence.contains_key(user_id)
    }

    /// The connection currently mapped for `user_id`, if any.
    pub fn current_client(&self, user_id: &str) -> Option<ClientId> {
        self.presence.get(user_id).map(|c| c.client_id)
    }

    pub fn online_users(&self) -> Vec<String> {
        self.presence.iter().map(|e| e.key().clone()).collect()
    }

    pub fn online_count(&self) -> usize {
        self.presence.len()
    }

    pub fn subscribe(&self, client_id: ClientId, user_id: &str, key: ConversationKey) {
        self.topics.subscribe(client_id, user_id, key);
    }

    pub fn unsubscribe(&self, client_id: ClientId, key: &ConversationKey) {
        self.topics.unsubscribe(client_id, key);
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }
}
