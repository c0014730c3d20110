//! Bulkhead strategy: bounds how many calls run concurrently, with a fixed-size queue
//! for callers arriving while every slot is busy. Unlike a wait-with-timeout, the
//! queue is a hard capacity — a caller arriving when both the slots and the queue are
//! full is rejected immediately rather than waiting to find out.

mod config;
mod events;

pub use config::{BulkheadConfig, BulkheadConfigBuilder};
pub use events::BulkheadEvent;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use resilience_core::{ExecutionContext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};
use tokio::sync::Semaphore;

pub struct Bulkhead<T, E> {
    semaphore: Arc<Semaphore>,
    queued: Arc<AtomicUsize>,
    config: Arc<BulkheadConfig>,
    _marker: std::marker::PhantomData<fn() -> (T, E)>,
}

impl<T, E> Bulkhead<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: BulkheadConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallelization));
        Self {
            semaphore,
            queued: Arc::new(AtomicUsize::new(0)),
            config: Arc::new(config),
            _marker: std::marker::PhantomData,
        }
    }

    /// Calls currently running, for observability outside the pipeline's event stream.
    pub fn active_calls(&self) -> usize {
        self.config.max_parallelization - self.semaphore.available_permits()
    }
}

/// Reserves a queue slot, releasing it on every exit path including cancellation, so
/// `queued` never drifts from the number of callers actually waiting.
struct QueueReservation {
    queued: Arc<AtomicUsize>,
}

impl Drop for QueueReservation {
    fn drop(&mut self) {
        self.queued.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T, E> ResilienceStrategy<T, ResilienceError<E>> for Bulkhead<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(
        &self,
        next: Arc<dyn Next<T, ResilienceError<E>>>,
        context: ExecutionContext,
    ) -> PinFuture<(Outcome<T, ResilienceError<E>>, ExecutionContext)> {
        let semaphore = self.semaphore.clone();
        let queued = self.queued.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let permit = match Arc::clone(&semaphore).try_acquire_owned() {
                Ok(permit) => permit,
                Err(_) => {
                    // Slots are saturated. Reserve a queue slot, rejecting immediately
                    // if the queue itself is already full.
                    let reservation = loop {
                        let current = queued.load(Ordering::SeqCst);
                        if current >= config.max_queuing {
                            config.event_listeners.emit(&BulkheadEvent::CallRejected {
                                pattern_name: config.name.clone(),
                                timestamp: Instant::now(),
                                max_concurrent_calls: config.max_parallelization,
                            });
                            #[cfg(feature = "metrics")]
                            metrics::counter!("bulkhead_calls_rejected_total", "bulkhead" => config.name.clone()).increment(1);
                            return (
                                Outcome::Exception(ResilienceError::BulkheadRejected {
                                    name: config.name.clone(),
                                    max_parallelization: config.max_parallelization,
                                }),
                                context,
                            );
                        }
                        if queued
                            .compare_exchange_weak(current, current + 1, Ordering::SeqCst, Ordering::SeqCst)
                            .is_ok()
                        {
                            break QueueReservation { queued: queued.clone() };
                        }
                    };

                    config.event_listeners.emit(&BulkheadEvent::CallQueued {
                        pattern_name: config.name.clone(),
                        timestamp: Instant::now(),
                        queue_depth: queued.load(Ordering::SeqCst),
                    });

                    let acquired = tokio::select! {
                        permit = Arc::clone(&semaphore).acquire_owned() => Some(permit),
                        _ = context.cancellation().cancelled() => None,
                    };
                    drop(reservation);

                    match acquired {
                        Some(Ok(permit)) => permit,
                        _ => return (Outcome::Exception(ResilienceError::OperationCanceled), context),
                    }
                }
            };

            let concurrent_calls = config.max_parallelization - semaphore.available_permits();
            config.event_listeners.emit(&BulkheadEvent::CallPermitted {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
                concurrent_calls,
            });
            #[cfg(feature = "metrics")]
            {
                metrics::counter!("bulkhead_calls_permitted_total", "bulkhead" => config.name.clone()).increment(1);
                metrics::gauge!("bulkhead_concurrent_calls", "bulkhead" => config.name.clone()).set(concurrent_calls as f64);
            }

            let started_at = Instant::now();
            let (outcome, context) = next.call(context).await;
            drop(permit);
            let duration = started_at.elapsed();

            if outcome.is_exception() {
                config.event_listeners.emit(&BulkheadEvent::CallFailed {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                });
            } else {
                config.event_listeners.emit(&BulkheadEvent::CallFinished {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                    duration,
                });
            }

            (outcome, context)
        })
    }
}
