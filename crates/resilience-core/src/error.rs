use std::time::Duration;
use thiserror::Error;

/// The unified error taxonomy surfaced by every strategy in a pipeline.
///
/// Each strategy either handles a call locally (and returns a handled outcome as an
/// `Ok` result, never an error) or surfaces one of these variants upward. `Inner`
/// carries the caller's own error type unchanged once every strategy has had a chance
/// to act on it.
#[derive(Debug, Error, PartialEq)]
pub enum ResilienceError<E> {
    #[error("circuit breaker '{name}' is open; call not permitted")]
    BrokenCircuit {
        name: String,
        last_handled: Option<String>,
    },

    #[error("circuit breaker '{name}' is isolated; call not permitted")]
    IsolatedCircuit { name: String },

    #[error("operation timed out after {elapsed:?}")]
    TimeoutRejected { elapsed: Duration },

    #[error(
        "bulkhead '{name}' rejected the call: {max_parallelization} already in flight and the queue is full"
    )]
    BulkheadRejected {
        name: String,
        max_parallelization: usize,
    },

    #[error("operation canceled")]
    OperationCanceled,

    #[error("manual control for '{name}' has been disposed")]
    ControllerDisposed { name: String },

    #[error("inner operation error: {0}")]
    Inner(#[source] E),
}

impl<E> ResilienceError<E> {
    pub fn is_broken_circuit(&self) -> bool {
        matches!(self, ResilienceError::BrokenCircuit { .. })
    }

    pub fn is_isolated_circuit(&self) -> bool {
        matches!(self, ResilienceError::IsolatedCircuit { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ResilienceError::TimeoutRejected { .. })
    }

    pub fn is_bulkhead_rejected(&self) -> bool {
        matches!(self, ResilienceError::BulkheadRejected { .. })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, ResilienceError::OperationCanceled)
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            ResilienceError::Inner(error) => Some(error),
            _ => None,
        }
    }

    pub fn inner(&self) -> Option<&E> {
        match self {
            ResilienceError::Inner(error) => Some(error),
            _ => None,
        }
    }
}

impl<E> From<E> for ResilienceError<E> {
    fn from(error: E) -> Self {
        ResilienceError::Inner(error)
    }
}
