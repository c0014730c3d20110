//! Retries a handled outcome with a configurable backoff shape, an optional shared
//! budget across calls, and cooperative cancellation of the wait between attempts.

mod backoff;
mod budget;
mod config;
mod events;

pub use backoff::{DecorrelatedJitter, ExponentialBackoff, FixedInterval, FnInterval, IntervalFunction, LinearInterval};
pub use budget::{AimdBudget, AimdBudgetBuilder, RetryBudget, RetryBudgetBuilder, TokenBucketBudget, TokenBucketBuilder};
pub use config::{BackoffMode, RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;

use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::{EventListeners, ExecutionContext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};

/// A strategy that re-invokes the wrapped operation when it produces a handled
/// outcome, waiting out a backoff delay between attempts.
pub struct Retry<T, E> {
    config: RetryConfig<T, E>,
    listeners: EventListeners<RetryEvent>,
}

impl<T, E> Retry<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: RetryConfig<T, E>) -> Self {
        Self {
            config,
            listeners: EventListeners::new(),
        }
    }

    pub fn with_listeners(mut self, listeners: EventListeners<RetryEvent>) -> Self {
        self.listeners = listeners;
        self
    }

    fn next_jitter(&self) -> Option<DecorrelatedJitter> {
        match &self.config.backoff_mode {
            BackoffMode::Jittered { base, max } => Some(DecorrelatedJitter::new(
                *base,
                *max,
                Arc::new(resilience_core::ThreadRngSource),
            )),
            _ => None,
        }
    }
}

impl<T, E> ResilienceStrategy<T, ResilienceError<E>> for Retry<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(
        &self,
        next: Arc<dyn Next<T, ResilienceError<E>>>,
        context: ExecutionContext,
    ) -> PinFuture<(Outcome<T, ResilienceError<E>>, ExecutionContext)> {
        let name = self.config.name.clone();
        let max_attempts = self.config.max_attempts;
        let max_delay = self.config.max_delay;
        let backoff_mode = self.config.backoff_mode.clone();
        let should_handle = self.config.should_handle.clone();
        let on_retry = self.config.on_retry.clone();
        let budget = self.config.budget.clone();
        let listeners = self.listeners.clone();
        let jitter = self.next_jitter();
        let interval_fn = match &backoff_mode {
            BackoffMode::Jittered { .. } => None,
            other => Some(other.interval_function(max_delay)),
        };

        Box::pin(async move {
            let mut context = context;
            let mut attempt = 0usize;

            loop {
                let (outcome, returned_context) = next.call(context).await;
                context = returned_context;

                if !should_handle(&outcome) {
                    listeners.emit(&RetryEvent::NotHandled {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                    });
                    return (outcome, context);
                }

                if attempt + 1 >= max_attempts {
                    listeners.emit(&RetryEvent::AttemptsExhausted {
                        pattern_name: name.clone(),
                        timestamp: Instant::now(),
                        attempts: attempt + 1,
                    });
                    return (outcome, context);
                }

                if context.is_canceled() {
                    return (Outcome::Exception(ResilienceError::OperationCanceled), context);
                }

                if let Some(budget) = &budget {
                    if !budget.try_withdraw() {
                        listeners.emit(&RetryEvent::BudgetExhausted {
                            pattern_name: name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                        });
                        return (outcome, context);
                    }
                }

                let delay = match (&jitter, &interval_fn) {
                    (Some(jitter), _) => jitter.next_delay(),
                    (None, Some(interval_fn)) => interval_fn.next_interval(attempt),
                    (None, None) => Duration::ZERO,
                };

                listeners.emit(&RetryEvent::Retry {
                    pattern_name: name.clone(),
                    timestamp: Instant::now(),
                    attempt,
                    delay,
                });
                if let Some(on_retry) = &on_retry {
                    on_retry(&outcome, attempt, delay);
                }

                if delay > Duration::ZERO {
                    let canceled = tokio::select! {
                        _ = tokio::time::sleep(delay) => false,
                        _ = context.cancellation().cancelled() => true,
                    };
                    if canceled {
                        listeners.emit(&RetryEvent::CanceledDuringBackoff {
                            pattern_name: name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                        });
                        return (Outcome::Exception(ResilienceError::OperationCanceled), context);
                    }
                }

                attempt += 1;
            }
        })
    }
}
