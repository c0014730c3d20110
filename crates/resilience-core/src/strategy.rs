use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::outcome::Outcome;

/// A boxed, owned future — the shape every strategy and continuation returns, matching
/// the `Box::pin(async move { ... })` convention used throughout this workspace.
pub type PinFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// The continuation a strategy invokes to reach the next strategy in the pipeline, or
/// the user's own callback at the innermost position. The context is passed by value
/// and handed back alongside the outcome so ownership threads cleanly through any
/// number of nested async calls without borrowing across `.await` points.
pub trait Next<T, E>: Send + Sync {
    fn call(&self, context: ExecutionContext) -> PinFuture<(Outcome<T, E>, ExecutionContext)>;
}

/// Adapts a plain async closure into a [`Next`].
pub struct FnNext<F> {
    f: F,
}

impl<F> FnNext<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F, T, E> Next<T, E> for FnNext<F>
where
    F: Fn(ExecutionContext) -> PinFuture<(Outcome<T, E>, ExecutionContext)> + Send + Sync,
{
    fn call(&self, context: ExecutionContext) -> PinFuture<(Outcome<T, E>, ExecutionContext)> {
        (self.f)(context)
    }
}

/// One fault-handling strategy in a pipeline.
///
/// A strategy must either:
/// - short-circuit, returning an outcome without invoking `next` at all (an open
///   circuit breaker, a full bulkhead, a cache hit);
/// - invoke `next` exactly once and return its outcome, possibly transformed (timeout,
///   fallback); or
/// - invoke `next` more than once (retry, hedging), returning whichever outcome it
///   ultimately chooses.
///
/// Implementations share their configuration and any mutable controller state (a
/// circuit's statistics, a bulkhead's semaphore, a cache's store) behind `Arc`, since a
/// single strategy instance is built once and reused across any number of concurrent
/// executions.
pub trait ResilienceStrategy<T, E>: Send + Sync + 'static {
    fn execute(
        &self,
        next: Arc<dyn Next<T, E>>,
        context: ExecutionContext,
    ) -> PinFuture<(Outcome<T, E>, ExecutionContext)>;
}
