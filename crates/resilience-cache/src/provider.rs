//! The pluggable storage surface a cache strategy sits on top of.

use resilience_core::PinFuture;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("cache provider error: {0}")]
pub struct CacheProviderError(pub String);

impl CacheProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Storage a [`crate::Cache`] strategy reads from and writes through.
///
/// `try_get` returns `(hit, value)` rather than collapsing a miss onto `None` so a
/// stored default (zero) value round-trips as a genuine hit.
pub trait CacheProvider<V>: Send + Sync {
    fn try_get(&self, key: &str) -> PinFuture<Result<(bool, Option<V>), CacheProviderError>>;

    fn put(&self, key: String, value: V, ttl: std::time::Duration) -> PinFuture<Result<(), CacheProviderError>>;
}
