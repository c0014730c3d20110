//! Circuit breaker strategy: tracks a sliding window of outcomes and stops calling a
//! struggling dependency once its failure (or slow-call) rate crosses a threshold,
//! probing recovery with a bounded number of half-open calls before fully reopening.

mod circuit;
mod config;
mod events;

pub use circuit::{CircuitMetrics, CircuitState};
pub use config::{CircuitBreakerConfig, CircuitBreakerConfigBuilder, SlidingWindowType};
pub use events::CircuitBreakerEvent;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;

use resilience_core::{ExecutionContext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};
use tokio::sync::Mutex;

use circuit::Circuit;

pub type ShouldHandle<T, E> = Arc<dyn Fn(&Outcome<T, E>) -> bool + Send + Sync>;

/// A handle for inspecting and manually overriding a circuit breaker's state,
/// independent of any particular clone of the strategy wrapping it in a pipeline.
#[derive(Clone)]
pub struct CircuitBreakerHandle {
    circuit: Arc<Mutex<Circuit>>,
    state_atomic: Arc<AtomicU8>,
    config: Arc<CircuitBreakerConfig>,
}

impl CircuitBreakerHandle {
    /// Lock-free snapshot of the current state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state_atomic.load(Ordering::Acquire))
    }

    pub async fn metrics(&self) -> CircuitMetrics {
        self.circuit.lock().await.metrics(&self.config)
    }

    /// Forces the circuit into `Isolated`, rejecting every call until [`close`] is
    /// called. Intended for operator-triggered maintenance windows.
    pub async fn isolate(&self) {
        self.circuit.lock().await.isolate(&self.config);
    }

    /// Forces the circuit back to `Closed` and resets its accounting, from any state.
    pub async fn close(&self) {
        self.circuit.lock().await.close(&self.config);
    }
}

/// The circuit breaker strategy. Classifies each outcome with `should_handle` (default:
/// every `Exception` counts as a failure) and feeds the result into the sliding window;
/// rejects calls outright while the circuit is `Open` or `Isolated`.
pub struct CircuitBreaker<T, E> {
    handle: CircuitBreakerHandle,
    should_handle: ShouldHandle<T, ResilienceError<E>>,
}

impl<T, E> CircuitBreaker<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self::with_classifier(config, |outcome| outcome.is_exception())
    }

    pub fn with_classifier<F>(config: CircuitBreakerConfig, should_handle: F) -> Self
    where
        F: Fn(&Outcome<T, ResilienceError<E>>) -> bool + Send + Sync + 'static,
    {
        let state_atomic = Arc::new(AtomicU8::new(CircuitState::Closed as u8));
        let circuit = Arc::new(Mutex::new(Circuit::new_with_atomic(state_atomic.clone())));
        Self {
            handle: CircuitBreakerHandle {
                circuit,
                state_atomic,
                config: Arc::new(config),
            },
            should_handle: Arc::new(should_handle),
        }
    }

    /// A cloneable handle for manual control, independent of the strategy's lifetime
    /// inside a pipeline.
    pub fn handle(&self) -> CircuitBreakerHandle {
        self.handle.clone()
    }
}

impl<T, E> ResilienceStrategy<T, ResilienceError<E>> for CircuitBreaker<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(
        &self,
        next: Arc<dyn Next<T, ResilienceError<E>>>,
        context: ExecutionContext,
    ) -> PinFuture<(Outcome<T, ResilienceError<E>>, ExecutionContext)> {
        let handle = self.handle.clone();
        let should_handle = self.should_handle.clone();

        Box::pin(async move {
            let admitted = {
                let mut circuit = handle.circuit.lock().await;
                circuit.try_acquire(&handle.config)
            };

            if !admitted {
                let state = handle.state();
                let error = if state == CircuitState::Isolated {
                    ResilienceError::IsolatedCircuit {
                        name: handle.config.name.clone(),
                    }
                } else {
                    ResilienceError::BrokenCircuit {
                        name: handle.config.name.clone(),
                        last_handled: None,
                    }
                };
                return (Outcome::Exception(error), context);
            }

            let started_at = Instant::now();
            let (outcome, context) = next.call(context).await;
            let elapsed = started_at.elapsed();

            let mut circuit = handle.circuit.lock().await;
            if should_handle(&outcome) {
                circuit.record_failure(&handle.config, elapsed);
            } else {
                circuit.record_success(&handle.config, elapsed);
            }

            (outcome, context)
        })
    }
}
