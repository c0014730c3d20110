//! The bundled in-memory [`CacheProvider`] backing most pipelines: an eviction-bounded
//! map with a fixed TTL per entry, guarded by a single async mutex.

use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::PinFuture;
use tokio::sync::Mutex;

use crate::eviction::{EvictionPolicy, EvictionStore, FifoStore, LfuStore, LruStore};
use crate::provider::{CacheProvider, CacheProviderError};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> Entry<V> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

struct Store<V> {
    backing: Box<dyn EvictionStore<String, Entry<V>>>,
}

/// An in-process cache keyed by string, bounded by `capacity` entries and evicting
/// under the given policy. Each entry carries its own TTL, set at `put` time.
pub struct InMemoryCacheProvider<V> {
    store: Arc<Mutex<Store<V>>>,
}

impl<V: Clone + Send + Sync + 'static> InMemoryCacheProvider<V> {
    pub fn new(capacity: usize, policy: EvictionPolicy) -> Self {
        let backing: Box<dyn EvictionStore<String, Entry<V>>> = match policy {
            EvictionPolicy::Lru => Box::new(LruStore::new(capacity)),
            EvictionPolicy::Lfu => Box::new(LfuStore::new(capacity)),
            EvictionPolicy::Fifo => Box::new(FifoStore::new(capacity)),
        };
        Self { store: Arc::new(Mutex::new(Store { backing })) }
    }

    pub async fn len(&self) -> usize {
        self.store.lock().await.backing.len()
    }

    pub async fn clear(&self) {
        self.store.lock().await.backing.clear();
    }
}

impl<V: Clone + Send + Sync + 'static> CacheProvider<V> for InMemoryCacheProvider<V> {
    fn try_get(&self, key: &str) -> PinFuture<Result<(bool, Option<V>), CacheProviderError>> {
        let store = self.store.clone();
        let key = key.to_string();
        Box::pin(async move {
            let mut store = store.lock().await;
            match store.backing.get(&key) {
                Some(entry) if entry.is_expired() => {
                    store.backing.remove(&key);
                    Ok((false, None))
                }
                Some(entry) => Ok((true, Some(entry.value.clone()))),
                None => Ok((false, None)),
            }
        })
    }

    fn put(&self, key: String, value: V, ttl: Duration) -> PinFuture<Result<(), CacheProviderError>> {
        let store = self.store.clone();
        Box::pin(async move {
            let mut store = store.lock().await;
            store.backing.insert(key, Entry { value, inserted_at: Instant::now(), ttl });
            Ok(())
        })
    }
}
