use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted: Instant,
}

/// Simple TTL cache for collaborator responses.
#[derive(Debug)]
pub struct TimedCache<K, V> {
    ttl: Duration,
    map: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TimedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            map: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.map.read().await;
        map.get(key).and_then(|entry| {
            if entry.inserted.elapsed() <= self.ttl {
                Some(entry.value.clone())
            } else {
                None
            }
        })
    }

    pub async fn set(&self, key: K, value: V) {
        let mut map = self.map.write().await;
        map.insert(
            key,
            CacheEntry {
                value,
                inserted: Instant::now(),
            },
        );
    }
}
