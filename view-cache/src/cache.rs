//! Type-erased read-through cache

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use common::error::Result;
use dashmap::DashMap;
use tracing::debug;

use crate::channel::{InvalidationChannel, InvalidationEvent};

/// Cache key: a collection name plus an optional sub-key
///
/// `("bots", None)` holds a user-independent view; `("bots", Some(user_id))`
/// holds one user's listing. Invalidating a collection drops every sub-key
/// under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Collection name (e.g., "bots", "deposits")
    pub collection: String,
    /// Optional sub-key, usually a user or entity ID
    pub sub_key: Option<String>,
}

impl CacheKey {
    /// Key for a whole collection
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            sub_key: None,
        }
    }

    /// Key for one entry within a collection
    pub fn entry(collection: impl Into<String>, sub_key: impl ToString) -> Self {
        Self {
            collection: collection.into(),
            sub_key: Some(sub_key.to_string()),
        }
    }
}

/// Read-through cache for query results
pub struct ViewCache {
    /// Cached values by key
    entries: DashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
    /// Invalidation broadcast channel
    channel: Arc<InvalidationChannel>,
}

impl ViewCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            channel: Arc::new(InvalidationChannel::new()),
        }
    }

    /// Get the invalidation channel
    pub fn channel(&self) -> Arc<InvalidationChannel> {
        self.channel.clone()
    }

    /// Cached value for a key, if present and of the expected type
    pub fn get<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<Arc<T>> {
        self.entries
            .get(key)
            .and_then(|entry| entry.clone().downcast::<T>().ok())
    }

    /// Return the cached value for a key, running the loader on a miss
    ///
    /// Concurrent misses may run the loader more than once; the last writer
    /// wins, which is acceptable for cached query results.
    pub async fn get_or_load<T, F, Fut>(&self, key: CacheKey, loader: F) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(cached) = self.get::<T>(&key) {
            debug!("Cache hit for {}/{:?}", key.collection, key.sub_key);
            return Ok(cached);
        }

        debug!("Cache miss for {}/{:?}", key.collection, key.sub_key);
        let value = Arc::new(loader().await?);
        self.entries
            .insert(key, value.clone() as Arc<dyn Any + Send + Sync>);

        Ok(value)
    }

    /// Drop one cached entry and broadcast the invalidation
    pub async fn invalidate(&self, key: &CacheKey) {
        self.entries.remove(key);
        self.channel
            .publish(InvalidationEvent {
                collection: key.collection.clone(),
                sub_key: key.sub_key.clone(),
            })
            .await;
    }

    /// Drop every entry under a collection whose sub-key starts with a prefix
    ///
    /// Used for keys composed as `owner/variant` so a writer can drop all of
    /// one owner's variants without touching other owners' entries.
    pub async fn invalidate_prefix(&self, collection: &str, prefix: &str) {
        self.entries.retain(|key, _| {
            !(key.collection == collection
                && key
                    .sub_key
                    .as_deref()
                    .map_or(false, |s| s.starts_with(prefix)))
        });
        self.channel
            .publish(InvalidationEvent {
                collection: collection.to_string(),
                sub_key: Some(prefix.to_string()),
            })
            .await;
    }

    /// Drop every entry under a collection and broadcast the invalidation
    pub async fn invalidate_collection(&self, collection: &str) {
        self.entries.retain(|key, _| key.collection != collection);
        self.channel
            .publish(InvalidationEvent {
                collection: collection.to_string(),
                sub_key: None,
            })
            .await;
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::new()
    }
}
