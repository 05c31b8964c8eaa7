//! Tests for the view cache

use std::sync::atomic::{AtomicUsize, Ordering};

use view_cache::{CacheKey, Topic, ViewCache};

#[tokio::test]
async fn test_get_or_load_caches_the_result() {
    let cache = ViewCache::new();
    let loads = AtomicUsize::new(0);
    let key = CacheKey::entry("bots", "user-1");

    let load = || async {
        loads.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["alpha".to_string(), "beta".to_string()])
    };

    let first = cache.get_or_load(key.clone(), load).await.unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    // Second read served from cache
    let second = cache
        .get_or_load(key.clone(), || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::<String>::new())
        })
        .await
        .unwrap();
    assert_eq!(second.len(), 2);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidate_drops_one_entry() {
    let cache = ViewCache::new();
    let key_a = CacheKey::entry("bots", "user-1");
    let key_b = CacheKey::entry("bots", "user-2");

    cache
        .get_or_load(key_a.clone(), || async { Ok(1u32) })
        .await
        .unwrap();
    cache
        .get_or_load(key_b.clone(), || async { Ok(2u32) })
        .await
        .unwrap();
    assert_eq!(cache.len(), 2);

    cache.invalidate(&key_a).await;
    assert!(cache.get::<u32>(&key_a).is_none());
    assert_eq!(cache.get::<u32>(&key_b).as_deref(), Some(&2));
}

#[tokio::test]
async fn test_invalidate_prefix_drops_only_matching_sub_keys() {
    let cache = ViewCache::new();

    // Listing keys composed as owner/limit
    cache
        .get_or_load(CacheKey::entry("deposits", "user-1/5"), || async { Ok(1u32) })
        .await
        .unwrap();
    cache
        .get_or_load(CacheKey::entry("deposits", "user-1/50"), || async { Ok(2u32) })
        .await
        .unwrap();
    cache
        .get_or_load(CacheKey::entry("deposits", "user-2/5"), || async { Ok(3u32) })
        .await
        .unwrap();
    cache
        .get_or_load(CacheKey::entry("funds", "user-1/5"), || async { Ok(4u32) })
        .await
        .unwrap();

    cache.invalidate_prefix("deposits", "user-1").await;

    assert!(cache
        .get::<u32>(&CacheKey::entry("deposits", "user-1/5"))
        .is_none());
    assert!(cache
        .get::<u32>(&CacheKey::entry("deposits", "user-1/50"))
        .is_none());
    assert_eq!(
        cache
            .get::<u32>(&CacheKey::entry("deposits", "user-2/5"))
            .as_deref(),
        Some(&3)
    );
    assert_eq!(
        cache
            .get::<u32>(&CacheKey::entry("funds", "user-1/5"))
            .as_deref(),
        Some(&4)
    );
}

#[tokio::test]
async fn test_invalidate_collection_drops_all_sub_keys() {
    let cache = ViewCache::new();

    cache
        .get_or_load(CacheKey::entry("bots", "user-1"), || async { Ok(1u32) })
        .await
        .unwrap();
    cache
        .get_or_load(CacheKey::entry("bots", "user-2"), || async { Ok(2u32) })
        .await
        .unwrap();
    cache
        .get_or_load(CacheKey::collection("funds"), || async { Ok(3u32) })
        .await
        .unwrap();

    cache.invalidate_collection("bots").await;

    assert!(cache.get::<u32>(&CacheKey::entry("bots", "user-1")).is_none());
    assert!(cache.get::<u32>(&CacheKey::entry("bots", "user-2")).is_none());
    assert_eq!(
        cache.get::<u32>(&CacheKey::collection("funds")).as_deref(),
        Some(&3)
    );
}

#[tokio::test]
async fn test_invalidation_events_reach_subscribers() {
    let cache = ViewCache::new();
    let channel = cache.channel();

    let (bots_rx, _id) = channel.subscribe(Topic::Collection("bots".to_string())).await;
    let (all_rx, _id) = channel.subscribe(Topic::AllCollections).await;

    cache.invalidate(&CacheKey::entry("bots", "user-1")).await;
    cache.invalidate_collection("funds").await;

    let event = bots_rx.try_recv().unwrap();
    assert_eq!(event.collection, "bots");
    assert_eq!(event.sub_key.as_deref(), Some("user-1"));
    assert!(bots_rx.try_recv().is_err());

    let first = all_rx.try_recv().unwrap();
    assert_eq!(first.collection, "bots");
    let second = all_rx.try_recv().unwrap();
    assert_eq!(second.collection, "funds");
    assert!(second.sub_key.is_none());
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let cache = ViewCache::new();
    let channel = cache.channel();

    let (rx, id) = channel.subscribe(Topic::AllCollections).await;
    assert!(channel.unsubscribe_by_id(id).await);

    cache.invalidate_collection("bots").await;
    assert!(rx.try_recv().is_err());
}
