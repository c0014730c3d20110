//! Composable resilience and fault-tolerance middleware built on the `tokio` async
//! substrate in [`resilience_core`].
//!
//! Each pattern lives in its own crate and is re-exported here as a module, gated
//! behind a matching feature so a consumer that only needs retry and a timeout does
//! not pull in the circuit breaker's atomic bookkeeping or the cache's LRU store.
//!
//! # Quick start
//!
//! ```toml
//! [dependencies]
//! resilience = { version = "0.1", features = ["retry", "circuitbreaker", "timeout"] }
//! ```
//!
//! ```no_run
//! use resilience::core::{ResiliencePipelineBuilder, ExecutionContext, Outcome, PinFuture, ResilienceError};
//! use resilience::{PipelineBuilderExt, RetryConfigBuilder};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let retry = RetryConfigBuilder::<(), std::io::Error>::new("retry").max_attempts(3).build().unwrap();
//!
//! let mut builder: ResiliencePipelineBuilder<(), ResilienceError<std::io::Error>> = ResiliencePipelineBuilder::new();
//! builder.add_retry(retry).add_timeout(Duration::from_secs(1));
//! let pipeline = builder.build();
//!
//! let outcome = pipeline
//!     .execute(
//!         |ctx| Box::pin(async move { (Outcome::Result(()), ctx) }) as PinFuture<_>,
//!         ExecutionContext::new(),
//!     )
//!     .await;
//! # let _ = outcome;
//! # }
//! ```
//!
//! # Picking patterns
//!
//! - **Retry** — transient failures where a second attempt is likely to succeed
//!   (network blips, optimistic-lock conflicts).
//! - **Circuit breaker** — a struggling dependency that retrying would only pile
//!   load onto; fails fast and gives it room to recover.
//! - **Timeout** — bounding tail latency so one slow dependency does not stall a
//!   whole request.
//! - **Bulkhead** — isolating one caller's concurrency so it cannot starve another.
//! - **Hedge** — trading extra work for lower tail latency against a flaky but cheap
//!   dependency.
//! - **Cache** — skipping the call altogether when a recent answer is still fresh.
//! - **Fallback** — the last line of defense: a degraded answer instead of an error.
//!
//! Patterns compose outer-to-inner in the order added to the builder. A common
//! ordering is cache (closest to the caller, avoids the rest entirely on a hit),
//! fallback (outermost error boundary), retry, circuit breaker, bulkhead, timeout
//! (closest to the callback).

pub use resilience_core as core;

#[cfg(feature = "retry")]
pub use resilience_retry as retry;
#[cfg(feature = "retry")]
pub use resilience_retry::{Retry, RetryConfig, RetryConfigBuilder, RetryEvent};

#[cfg(feature = "circuitbreaker")]
pub use resilience_circuitbreaker as circuitbreaker;
#[cfg(feature = "circuitbreaker")]
pub use resilience_circuitbreaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerEvent, CircuitBreakerHandle, CircuitMetrics,
    CircuitState,
};

#[cfg(feature = "timeout")]
pub use resilience_timeout as timeout;
#[cfg(feature = "timeout")]
pub use resilience_timeout::{Timeout, TimeoutConfig, TimeoutConfigBuilder, TimeoutEvent, TimeoutMode};

#[cfg(feature = "bulkhead")]
pub use resilience_bulkhead as bulkhead;
#[cfg(feature = "bulkhead")]
pub use resilience_bulkhead::{Bulkhead, BulkheadConfig, BulkheadConfigBuilder, BulkheadEvent};

#[cfg(feature = "hedge")]
pub use resilience_hedge as hedge;
#[cfg(feature = "hedge")]
pub use resilience_hedge::{Hedge, HedgeConfig, HedgeConfigBuilder, HedgeDelay, HedgeEvent};

#[cfg(feature = "cache")]
pub use resilience_cache as cache;
#[cfg(feature = "cache")]
pub use resilience_cache::{Cache, CacheConfig, CacheConfigBuilder, CacheEvent, CacheKey, CacheProvider, EvictionPolicy, InMemoryCacheProvider};

#[cfg(feature = "fallback")]
pub use resilience_fallback as fallback;
#[cfg(feature = "fallback")]
pub use resilience_fallback::{Fallback, FallbackConfig, FallbackConfigBuilder, FallbackEvent};

use resilience_core::{ResiliencePipelineBuilder, ResilienceError};

/// Convenience methods on [`ResiliencePipelineBuilder`] so a pipeline reads as a flat
/// list of patterns instead of a series of `add_strategy(SomeStrategy::new(...))`
/// calls. Each method is gated behind the matching crate feature.
pub trait PipelineBuilderExt<T, E> {
    #[cfg(feature = "retry")]
    fn add_retry(&mut self, config: RetryConfig<T, E>) -> &mut Self;

    #[cfg(feature = "circuitbreaker")]
    fn add_circuit_breaker(&mut self, config: CircuitBreakerConfig) -> &mut Self;

    #[cfg(feature = "circuitbreaker")]
    fn add_circuit_breaker_instance(&mut self, breaker: CircuitBreaker<T, E>) -> &mut Self;

    #[cfg(feature = "timeout")]
    fn add_timeout(&mut self, duration: std::time::Duration) -> &mut Self;

    #[cfg(feature = "timeout")]
    fn add_timeout_with(&mut self, config: TimeoutConfig) -> &mut Self;

    #[cfg(feature = "bulkhead")]
    fn add_bulkhead(&mut self, config: BulkheadConfig) -> &mut Self;

    #[cfg(feature = "hedge")]
    fn add_hedge(&mut self, config: HedgeConfig<T, ResilienceError<E>>) -> &mut Self;

    #[cfg(feature = "cache")]
    fn add_cache(&mut self, config: CacheConfig<T>) -> &mut Self;

    #[cfg(feature = "fallback")]
    fn add_fallback(&mut self, config: FallbackConfig<T, ResilienceError<E>>) -> &mut Self;
}

impl<T, E> PipelineBuilderExt<T, E> for ResiliencePipelineBuilder<T, ResilienceError<E>>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    #[cfg(feature = "retry")]
    fn add_retry(&mut self, config: RetryConfig<T, E>) -> &mut Self {
        self.add_strategy(Retry::new(config))
    }

    #[cfg(feature = "circuitbreaker")]
    fn add_circuit_breaker(&mut self, config: CircuitBreakerConfig) -> &mut Self {
        self.add_strategy(CircuitBreaker::new(config))
    }

    #[cfg(feature = "circuitbreaker")]
    fn add_circuit_breaker_instance(&mut self, breaker: CircuitBreaker<T, E>) -> &mut Self {
        self.add_strategy(breaker)
    }

    #[cfg(feature = "timeout")]
    fn add_timeout(&mut self, duration: std::time::Duration) -> &mut Self {
        let config = TimeoutConfigBuilder::new().timeout_duration(duration).build().expect("a positive duration is always valid");
        self.add_strategy(Timeout::new(config))
    }

    #[cfg(feature = "timeout")]
    fn add_timeout_with(&mut self, config: TimeoutConfig) -> &mut Self {
        self.add_strategy(Timeout::new(config))
    }

    #[cfg(feature = "bulkhead")]
    fn add_bulkhead(&mut self, config: BulkheadConfig) -> &mut Self {
        self.add_strategy(Bulkhead::new(config))
    }

    #[cfg(feature = "hedge")]
    fn add_hedge(&mut self, config: HedgeConfig<T, ResilienceError<E>>) -> &mut Self {
        self.add_strategy(Hedge::new(config))
    }

    #[cfg(feature = "cache")]
    fn add_cache(&mut self, config: CacheConfig<T>) -> &mut Self {
        self.add_strategy(Cache::new(config))
    }

    #[cfg(feature = "fallback")]
    fn add_fallback(&mut self, config: FallbackConfig<T, ResilienceError<E>>) -> &mut Self {
        self.add_strategy(Fallback::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience_core::{ExecutionContext, Outcome, PinFuture, ResiliencePipelineBuilder};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn retry_and_timeout_compose_through_the_convenience_builder() {
        let retry = RetryConfigBuilder::<i32, String>::new("retry").max_attempts(3).build().unwrap();

        let mut builder: ResiliencePipelineBuilder<i32, ResilienceError<String>> = ResiliencePipelineBuilder::new();
        builder.add_retry(retry).add_timeout(Duration::from_millis(500));
        let pipeline = builder.build();

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = attempts.clone();
        let outcome = pipeline
            .execute(
                move |ctx| {
                    let attempts = attempts_clone.clone();
                    Box::pin(async move {
                        let n = attempts.fetch_add(1, Ordering::SeqCst);
                        if n < 2 {
                            (Outcome::Exception(ResilienceError::Inner("transient".to_string())), ctx)
                        } else {
                            (Outcome::Result(n as i32), ctx)
                        }
                    }) as PinFuture<_>
                },
                ExecutionContext::new(),
            )
            .await;

        assert_eq!(outcome.into_result(), Ok(2));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn a_circuit_breaker_instance_keeps_its_handle_usable_after_being_added() {
        let config = CircuitBreakerConfigBuilder::new().minimum_number_of_calls(1).failure_rate_threshold(0.5).build().unwrap();
        let breaker: CircuitBreaker<i32, String> = CircuitBreaker::new(config);
        let handle = breaker.handle();

        let mut builder: ResiliencePipelineBuilder<i32, ResilienceError<String>> = ResiliencePipelineBuilder::new();
        builder.add_circuit_breaker_instance(breaker);
        let pipeline = builder.build();

        let outcome = pipeline
            .execute(
                |ctx| Box::pin(async move { (Outcome::Exception(ResilienceError::Inner("boom".to_string())), ctx) }) as PinFuture<_>,
                ExecutionContext::new(),
            )
            .await;
        assert!(outcome.is_exception());
        assert_eq!(handle.state(), CircuitState::Open);
    }
}
