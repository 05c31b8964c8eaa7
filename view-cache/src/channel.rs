//! Channel for cache invalidation broadcast

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam_channel::{self, Receiver, Sender};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Topic types for invalidation events
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Invalidations for one collection
    Collection(String),
    /// All invalidations
    AllCollections,
}

/// Invalidation event pushed to subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Collection whose cached views were dropped
    pub collection: String,
    /// Specific sub-key, or None when the whole collection was dropped
    pub sub_key: Option<String>,
}

/// Subscription entry
struct SubscriptionEntry {
    /// Sender channel
    sender: Sender<Arc<InvalidationEvent>>,
    /// Subscription ID
    id: Uuid,
}

/// Invalidation broadcast channel
pub struct InvalidationChannel {
    /// Senders by topic
    senders: Mutex<HashMap<Topic, Vec<SubscriptionEntry>>>,
}

impl InvalidationChannel {
    /// Create a new invalidation channel
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a topic; returns the receiver and a subscription ID
    pub async fn subscribe(&self, topic: Topic) -> (Receiver<Arc<InvalidationEvent>>, Uuid) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let subscription_id = Uuid::new_v4();

        let mut senders = self.senders.lock().await;
        senders.entry(topic).or_default().push(SubscriptionEntry {
            sender,
            id: subscription_id,
        });

        (receiver, subscription_id)
    }

    /// Publish an invalidation event
    pub async fn publish(&self, event: InvalidationEvent) {
        let topic = Topic::Collection(event.collection.clone());
        let event = Arc::new(event);
        let mut senders = self.senders.lock().await;

        if let Some(topic_senders) = senders.get_mut(&topic) {
            for entry in topic_senders.iter() {
                let _ = entry.sender.try_send(event.clone());
            }
        }

        if let Some(all_senders) = senders.get_mut(&Topic::AllCollections) {
            for entry in all_senders.iter() {
                let _ = entry.sender.try_send(event.clone());
            }
        }
    }

    /// Unsubscribe using subscription ID
    pub async fn unsubscribe_by_id(&self, subscription_id: Uuid) -> bool {
        let mut senders = self.senders.lock().await;
        let mut found = false;

        for (_topic, entries) in senders.iter_mut() {
            let initial_len = entries.len();
            entries.retain(|entry| entry.id != subscription_id);

            if entries.len() < initial_len {
                found = true;
            }
        }

        found
    }
}

impl Default for InvalidationChannel {
    fn default() -> Self {
        Self::new()
    }
}
