//! Cache strategy: short-circuits a pipeline with a previously produced value when one
//! is available under the call's key, and stores a freshly produced value for next
//! time.

mod config;
mod eviction;
mod events;
mod provider;
mod store;

pub use config::{CacheConfig, CacheConfigBuilder, CacheKey, TtlStrategy};
pub use eviction::EvictionPolicy;
pub use events::CacheEvent;
pub use provider::{CacheProvider, CacheProviderError};
pub use store::InMemoryCacheProvider;

use std::sync::Arc;
use std::time::Instant;

use resilience_core::{ExecutionContext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};

pub struct Cache<T, E> {
    config: CacheConfig<T>,
    _error: std::marker::PhantomData<fn() -> E>,
}

impl<T, E> Cache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: CacheConfig<T>) -> Self {
        Self { config, _error: std::marker::PhantomData }
    }
}

impl<T, E> ResilienceStrategy<T, ResilienceError<E>> for Cache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(
        &self,
        next: Arc<dyn Next<T, ResilienceError<E>>>,
        context: ExecutionContext,
    ) -> PinFuture<(Outcome<T, ResilienceError<E>>, ExecutionContext)> {
        let provider = self.config.provider.clone();
        let ttl = self.config.ttl.clone();
        let key_strategy = self.config.key_strategy.clone();
        let name = self.config.name.clone();
        let listeners = self.config.event_listeners.clone();

        Box::pin(async move {
            let Some(key) = key_strategy(&context) else {
                return next.call(context).await;
            };

            match provider.try_get(&key).await {
                Ok((true, Some(value))) => {
                    listeners.emit(&CacheEvent::Hit { pattern_name: name.clone(), timestamp: Instant::now(), key });
                    if context.is_canceled() {
                        return (Outcome::Exception(ResilienceError::OperationCanceled), context);
                    }
                    return (Outcome::Result(value), context);
                }
                Ok(_) => {
                    listeners.emit(&CacheEvent::Miss { pattern_name: name.clone(), timestamp: Instant::now(), key: key.clone() });
                }
                Err(error) => {
                    listeners.emit(&CacheEvent::GetError {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        key: key.clone(),
                        message: error.to_string(),
                    });
                }
            }

            let (outcome, context) = next.call(context).await;

            if let Outcome::Result(value) = &outcome {
                let duration = ttl.ttl_for(value);
                if duration > std::time::Duration::ZERO {
                    if let Err(error) = provider.put(key.clone(), value.clone(), duration).await {
                        listeners.emit(&CacheEvent::PutError {
                            pattern_name: name.clone(),
                            timestamp: Instant::now(),
                            key: key.clone(),
                            message: error.to_string(),
                        });
                    } else {
                        listeners.emit(&CacheEvent::Put { pattern_name: name.clone(), timestamp: Instant::now(), key });
                    }
                }
            }

            (outcome, context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience_core::FnNext;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_next(calls: Arc<AtomicUsize>, value: i32) -> Arc<dyn Next<i32, ResilienceError<String>>> {
        Arc::new(FnNext::new(move |context: ExecutionContext| {
            let calls = calls.clone();
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                (Outcome::Result(value), context)
            }) as PinFuture<(Outcome<i32, ResilienceError<String>>, ExecutionContext)>
        }))
    }

    fn context_with_key(key: &str) -> ExecutionContext {
        ExecutionContext::new().with_operation_key(key)
    }

    #[tokio::test]
    async fn a_miss_calls_next_and_then_a_repeat_call_hits_without_calling_next_again() {
        let provider = Arc::new(InMemoryCacheProvider::<i32>::new(10, EvictionPolicy::Lru));
        let config = CacheConfigBuilder::new("cache", provider).ttl(Duration::from_secs(60)).build().unwrap();
        let cache: Cache<i32, String> = Cache::new(config);

        let calls = Arc::new(AtomicUsize::new(0));
        let next = counting_next(calls.clone(), 42);

        let (outcome, _) = cache.execute(next.clone(), context_with_key("k")).await;
        assert!(matches!(outcome, Outcome::Result(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (outcome, _) = cache.execute(next, context_with_key("k")).await;
        assert!(matches!(outcome, Outcome::Result(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn the_default_strategy_keys_on_operation_key_not_the_property_bag() {
        let provider = Arc::new(InMemoryCacheProvider::<i32>::new(10, EvictionPolicy::Lru));
        let config = CacheConfigBuilder::new("cache", provider).build().unwrap();
        let cache: Cache<i32, String> = Cache::new(config);

        let calls = Arc::new(AtomicUsize::new(0));
        let next = counting_next(calls.clone(), 1);

        // A CacheKey left in the property bag with no operation_key set must not be
        // picked up by the default strategy; scenario 6 expects a bypass (no key, no
        // cache), not a cache keyed off out-of-band state.
        let mut context = ExecutionContext::new();
        context.properties_mut().insert(CacheKey("k".to_string()));
        cache.execute(next.clone(), context).await;

        let mut context = ExecutionContext::new();
        context.properties_mut().insert(CacheKey("k".to_string()));
        cache.execute(next, context).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn an_absent_cache_key_bypasses_the_cache_entirely() {
        let provider = Arc::new(InMemoryCacheProvider::<i32>::new(10, EvictionPolicy::Lru));
        let config = CacheConfigBuilder::new("cache", provider).build().unwrap();
        let cache: Cache<i32, String> = Cache::new(config);

        let calls = Arc::new(AtomicUsize::new(0));
        let next = counting_next(calls.clone(), 1);

        cache.execute(next.clone(), ExecutionContext::new()).await;
        cache.execute(next, ExecutionContext::new()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_zero_ttl_suppresses_the_put_so_every_call_misses() {
        let provider = Arc::new(InMemoryCacheProvider::<i32>::new(10, EvictionPolicy::Lru));
        let config = CacheConfigBuilder::new("cache", provider).ttl(Duration::ZERO).build().unwrap();
        let cache: Cache<i32, String> = Cache::new(config);

        let calls = Arc::new(AtomicUsize::new(0));
        let next = counting_next(calls.clone(), 1);

        cache.execute(next.clone(), context_with_key("k")).await;
        cache.execute(next, context_with_key("k")).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_stored_zero_value_is_returned_as_a_hit_not_treated_as_absent() {
        let provider = Arc::new(InMemoryCacheProvider::<i32>::new(10, EvictionPolicy::Lru));
        let config = CacheConfigBuilder::new("cache", provider).ttl(Duration::from_secs(60)).build().unwrap();
        let cache: Cache<i32, String> = Cache::new(config);

        let calls = Arc::new(AtomicUsize::new(0));
        let next = counting_next(calls.clone(), 0);

        cache.execute(next.clone(), context_with_key("k")).await;
        let (outcome, _) = cache.execute(next, context_with_key("k")).await;
        assert!(matches!(outcome, Outcome::Result(0)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
