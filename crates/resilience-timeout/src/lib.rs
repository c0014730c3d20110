//! Timeout strategy with two abandonment modes: pessimistic runs the wrapped operation
//! on a detached task and, once the deadline elapses, stops waiting on it and discards
//! whatever it eventually returns; optimistic instead signals the operation's linked
//! cancellation token and waits for it to return cooperatively. `Duration::MAX` disables
//! the strategy outright.

mod config;
mod events;

pub use config::{TimeoutConfig, TimeoutConfigBuilder, TimeoutMode};
pub use events::TimeoutEvent;

use std::sync::Arc;
use std::time::Instant;

use resilience_core::{ExecutionContext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};

pub struct Timeout<T, E> {
    config: Arc<TimeoutConfig>,
    _marker: std::marker::PhantomData<fn() -> (T, E)>,
}

impl<T, E> Timeout<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: TimeoutConfig) -> Self {
        Self {
            config: Arc::new(config),
            _marker: std::marker::PhantomData,
        }
    }
}

impl<T, E> ResilienceStrategy<T, ResilienceError<E>> for Timeout<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(
        &self,
        next: Arc<dyn Next<T, ResilienceError<E>>>,
        context: ExecutionContext,
    ) -> PinFuture<(Outcome<T, ResilienceError<E>>, ExecutionContext)> {
        let config = self.config.clone();

        Box::pin(async move {
            let child = context.child();
            let started_at = Instant::now();

            if config.timeout_duration == std::time::Duration::MAX {
                // An infinite timeout disables the strategy outright: no deadline, no
                // child cancellation token, no detached task.
                let (outcome, _child_context) = next.call(child).await;
                emit_completion(&config, &outcome, started_at.elapsed());
                return (outcome, context);
            }

            match config.mode {
                config::TimeoutMode::Pessimistic => {
                    // The work runs on its own spawned task so that, on timeout, we can
                    // stop waiting on it without dropping it: it keeps running to
                    // completion on its own, and whatever it finally returns is discarded.
                    let handle = tokio::spawn(next.call(child));
                    match tokio::time::timeout(config.timeout_duration, handle).await {
                        Ok(Ok((outcome, _child_context))) => {
                            emit_completion(&config, &outcome, started_at.elapsed());
                            (outcome, context)
                        }
                        Ok(Err(_)) | Err(_) => {
                            emit_timeout(&config);
                            (
                                Outcome::Exception(ResilienceError::TimeoutRejected {
                                    elapsed: config.timeout_duration,
                                }),
                                context,
                            )
                        }
                    }
                }
                config::TimeoutMode::Optimistic => {
                    let cancel_handle = child.cancellation().clone();
                    let call_future = next.call(child);
                    tokio::pin!(call_future);

                    tokio::select! {
                        (outcome, _child_context) = &mut call_future => {
                            emit_completion(&config, &outcome, started_at.elapsed());
                            (outcome, context)
                        }
                        _ = tokio::time::sleep(config.timeout_duration) => {
                            cancel_handle.cancel();
                            let _ = call_future.await;
                            emit_timeout(&config);
                            (
                                Outcome::Exception(ResilienceError::TimeoutRejected {
                                    elapsed: config.timeout_duration,
                                }),
                                context,
                            )
                        }
                    }
                }
            }
        })
    }
}

fn emit_completion<T, E>(config: &TimeoutConfig, outcome: &Outcome<T, ResilienceError<E>>, duration: std::time::Duration) {
    if outcome.is_exception() {
        config.event_listeners.emit(&TimeoutEvent::Error {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            duration,
        });
        #[cfg(feature = "metrics")]
        metrics::counter!("timeout_calls_total", "timeout" => config.name.clone(), "outcome" => "error").increment(1);
    } else {
        config.event_listeners.emit(&TimeoutEvent::Success {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            duration,
        });
        #[cfg(feature = "metrics")]
        metrics::counter!("timeout_calls_total", "timeout" => config.name.clone(), "outcome" => "success").increment(1);
    }
}

fn emit_timeout(config: &TimeoutConfig) {
    config.event_listeners.emit(&TimeoutEvent::Timeout {
        pattern_name: config.name.clone(),
        timestamp: Instant::now(),
        timeout_duration: config.timeout_duration,
    });
    #[cfg(feature = "tracing")]
    tracing::warn!(timeout = %config.name, duration = ?config.timeout_duration, "call timed out");
    #[cfg(feature = "metrics")]
    metrics::counter!("timeout_rejections_total", "timeout" => config.name.clone()).increment(1);
}
