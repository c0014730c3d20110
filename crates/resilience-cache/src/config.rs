use std::sync::Arc;
use std::time::Duration;

use resilience_core::{EventListeners, ExecutionContext, FnListener, ValidationError, Validator};

use crate::events::CacheEvent;
use crate::provider::CacheProvider;

/// Out-of-band cache key override carried on an [`ExecutionContext`]'s property bag.
/// Only consulted by a custom key strategy built on top of [`CacheKey::from_context`];
/// the default strategy reads `ExecutionContext::operation_key` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey(pub String);

impl CacheKey {
    /// Convenience for a custom `key_strategy` that wants the property-bag override
    /// with a fallback to `operation_key`.
    pub fn from_context(context: &ExecutionContext) -> Option<String> {
        context
            .properties()
            .get::<CacheKey>()
            .map(|key| key.0.clone())
            .filter(|k| !k.is_empty())
            .or_else(|| operation_key(context))
    }
}

pub type KeyStrategy = Arc<dyn Fn(&ExecutionContext) -> Option<String> + Send + Sync>;

/// Default key strategy: the context's `operation_key`, bypassing the cache entirely
/// when it is absent or empty, matching the "no key, no cache" rule.
fn operation_key(context: &ExecutionContext) -> Option<String> {
    context.operation_key().map(str::to_owned).filter(|k| !k.is_empty())
}

/// How long a freshly produced value stays cached. `Computed` derives the duration
/// from the value itself (e.g. an API response that carries its own expiry).
pub enum TtlStrategy<T> {
    Fixed(Duration),
    Computed(Arc<dyn Fn(&T) -> Duration + Send + Sync>),
}

impl<T> Clone for TtlStrategy<T> {
    fn clone(&self) -> Self {
        match self {
            TtlStrategy::Fixed(duration) => TtlStrategy::Fixed(*duration),
            TtlStrategy::Computed(f) => TtlStrategy::Computed(f.clone()),
        }
    }
}

impl<T> TtlStrategy<T> {
    pub(crate) fn ttl_for(&self, value: &T) -> Duration {
        match self {
            TtlStrategy::Fixed(duration) => *duration,
            TtlStrategy::Computed(f) => f(value),
        }
    }
}

pub struct CacheConfig<T> {
    pub(crate) name: String,
    pub(crate) provider: Arc<dyn CacheProvider<T>>,
    pub(crate) ttl: TtlStrategy<T>,
    pub(crate) key_strategy: KeyStrategy,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
}

impl<T> Clone for CacheConfig<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            provider: self.provider.clone(),
            ttl: self.ttl.clone(),
            key_strategy: self.key_strategy.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

pub struct CacheConfigBuilder<T> {
    name: String,
    provider: Arc<dyn CacheProvider<T>>,
    ttl: TtlStrategy<T>,
    key_strategy: KeyStrategy,
    event_listeners: EventListeners<CacheEvent>,
}

impl<T: Send + Sync + 'static> CacheConfigBuilder<T> {
    pub fn new(name: impl Into<String>, provider: Arc<dyn CacheProvider<T>>) -> Self {
        Self {
            name: name.into(),
            provider,
            ttl: TtlStrategy::Fixed(Duration::from_secs(60)),
            key_strategy: Arc::new(operation_key),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = TtlStrategy::Fixed(ttl);
        self
    }

    pub fn computed_ttl<F>(mut self, f: F) -> Self
    where
        F: Fn(&T) -> Duration + Send + Sync + 'static,
    {
        self.ttl = TtlStrategy::Computed(Arc::new(f));
        self
    }

    pub fn key_strategy<F>(mut self, f: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Option<String> + Send + Sync + 'static,
    {
        self.key_strategy = Arc::new(f);
        self
    }

    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if let CacheEvent::Hit { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    pub fn on_miss<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if let CacheEvent::Miss { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    pub fn on_put<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if let CacheEvent::Put { key, .. } = event {
                f(key);
            }
        }));
        self
    }

    pub fn on_get_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if let CacheEvent::GetError { key, message, .. } = event {
                f(key, message);
            }
        }));
        self
    }

    pub fn on_put_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CacheEvent| {
            if let CacheEvent::PutError { key, message, .. } = event {
                f(key, message);
            }
        }));
        self
    }

    pub fn build(self) -> Result<CacheConfig<T>, ValidationError> {
        Validator::new(&self.name).finish()?;

        Ok(CacheConfig {
            name: self.name,
            provider: self.provider,
            ttl: self.ttl,
            key_strategy: self.key_strategy,
            event_listeners: self.event_listeners,
        })
    }
}
