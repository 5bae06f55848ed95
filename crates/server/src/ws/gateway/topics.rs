use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

use super::ClientId;
use crate::messaging::ConversationKey;

/// Pub/sub routing keyed by canonical conversation key. A topic holds the
/// connections that currently have that conversation open.
#[derive(Default)]
pub struct Topics {
    /// key -> client -> owning user
    subscribers: DashMap<ConversationKey, HashMap<ClientId, String>>,
    memberships: DashMap<ClientId, HashSet<ConversationKey>>,
}

impl Topics {
    pub fn subscribe(&self, client_id: ClientId, user_id: &str, key: ConversationKey) {
        self.subscribers
            .entry(key.clone())
            .or_default()
            .insert(client_id, user_id.to_string());
        self.memberships.entry(client_id).or_default().insert(key);
    }

    pub fn unsubscribe(&self, client_id: ClientId, key: &ConversationKey) {
        self.remove_subscriber(client_id, key);
        if let Some(mut keys) = self.memberships.get_mut(&client_id) {
            keys.remove(key);
        }
        self.memberships.remove_if(&client_id, |_, keys| keys.is_empty());
    }

    /// Forgets every subscription held by a connection.
    pub fn drop_client(&self, client_id: ClientId) {
        let keys = match self.memberships.remove(&client_id) {
            Some((_, keys)) => keys,
            None => return,
        };
        for key in &keys {
            self.remove_subscriber(client_id, key);
        }
    }

    fn remove_subscriber(&self, client_id: ClientId, key: &ConversationKey) {
        if let Some(mut subs) = self.subscribers.get_mut(key) {
            subs.remove(&client_id);
        }
        self.subscribers.remove_if(key, |_, subs| subs.is_empty());
    }

    /// Snapshot of `(client, user)` pairs subscribed to `key`.
    pub fn subscribers(&self, key: &ConversationKey) -> Vec<(ClientId, String)> {
        self.subscribers
            .get(key)
            .map(|subs| subs.iter().map(|(c, u)| (*c, u.clone())).collect())
            .unwrap_or_default()
    }

    pub fn is_subscribed(&self, client_id: ClientId, key: &ConversationKey) -> bool {
        self.subscribers
            .get(key)
            .map(|subs| subs.contains_key(&client_id))
            .unwrap_or(false)
    }

    pub fn topic_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_and_unsubscribe_cleans_up() {
        let topics = Topics::default();
        let key = ConversationKey::new("a", "b");

        topics.subscribe(1, "a", key.clone());
        topics.subscribe(2, "b", key.clone());
        assert_eq!(topics.subscribers(&key).len(), 2);

        topics.unsubscribe(1, &key);
        assert!(!topics.is_subscribed(1, &key));
        assert!(topics.is_subscribed(2, &key));

        topics.drop_client(2);
        assert_eq!(topics.topic_count(), 0);
    }
}
