use std::collections::HashSet;
use std::sync::Arc;

use crate::context::{block_on, ExecutionContext};
use crate::outcome::Outcome;
use crate::strategy::{FnNext, Next, PinFuture, ResilienceStrategy};

/// An immutable, ordered composition of strategies, built once by a
/// [`ResiliencePipelineBuilder`] and safe to call concurrently from any number of
/// callers for as long as it lives. Strategies are invoked outer-to-inner: the first
/// strategy added is the outermost wrapper around the user callback.
pub struct ResiliencePipeline<T, E> {
    strategies: Arc<[Arc<dyn ResilienceStrategy<T, E>>]>,
}

impl<T, E> Clone for ResiliencePipeline<T, E> {
    fn clone(&self) -> Self {
        Self {
            strategies: Arc::clone(&self.strategies),
        }
    }
}

impl<T, E> ResiliencePipeline<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// A pipeline with no strategies: invokes the callback exactly once and returns
    /// its outcome unchanged.
    pub fn noop() -> Self {
        Self {
            strategies: Arc::from(Vec::new()),
        }
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Executes `operation` through every strategy in the pipeline, outermost first.
    pub async fn execute<F, Fut>(&self, operation: F, context: ExecutionContext) -> Outcome<T, E>
    where
        F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = (Outcome<T, E>, ExecutionContext)> + Send + 'static,
    {
        let operation = Arc::new(operation);
        let mut next: Arc<dyn Next<T, E>> = Arc::new(FnNext::new(move |ctx: ExecutionContext| {
            let operation = Arc::clone(&operation);
            Box::pin(async move { operation(ctx).await }) as PinFuture<_>
        }));

        for strategy in self.strategies.iter().rev() {
            let strategy = Arc::clone(strategy);
            let inner_next = Arc::clone(&next);
            next = Arc::new(FnNext::new(move |ctx: ExecutionContext| {
                let strategy = Arc::clone(&strategy);
                let inner_next = Arc::clone(&inner_next);
                Box::pin(async move { strategy.execute(inner_next, ctx).await }) as PinFuture<_>
            }));
        }

        let (outcome, _context) = next.call(context).await;
        outcome
    }

    /// Runs [`execute`](Self::execute) to completion from synchronous code. Strategies
    /// read `context.is_synchronous()` to decide between blocking and yielding
    /// primitives where both are meaningful (e.g. a bulkhead's wait).
    pub fn execute_blocking<F, Fut>(&self, operation: F, context: ExecutionContext) -> Outcome<T, E>
    where
        F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = (Outcome<T, E>, ExecutionContext)> + Send + 'static,
    {
        let pipeline = self.clone();
        block_on(async move { pipeline.execute(operation, context).await })
    }
}

/// Builds a [`ResiliencePipeline`] from an outer-to-inner sequence of strategies.
///
/// The builder is single-use: calling [`build`](Self::build) twice, or adding a
/// strategy after building, is a programmer error and panics. Adding the same
/// strategy instance twice (by `Arc` identity) is likewise a programmer error.
pub struct ResiliencePipelineBuilder<T, E> {
    strategies: Vec<Arc<dyn ResilienceStrategy<T, E>>>,
    seen: HashSet<usize>,
    built: bool,
}

impl<T, E> ResiliencePipelineBuilder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            seen: HashSet::new(),
            built: false,
        }
    }

    /// Appends a strategy instance as the next layer, outer-to-inner.
    pub fn add_strategy<S>(&mut self, strategy: S) -> &mut Self
    where
        S: ResilienceStrategy<T, E>,
    {
        self.add_shared(Arc::new(strategy))
    }

    /// Appends an already-shared strategy — used when the same controller (e.g. a
    /// circuit breaker) must back more than one pipeline.
    pub fn add_shared(&mut self, strategy: Arc<dyn ResilienceStrategy<T, E>>) -> &mut Self {
        assert!(
            !self.built,
            "pipeline builder used after build(): builders are single-use"
        );
        let identity = Arc::as_ptr(&strategy) as *const () as usize;
        assert!(
            self.seen.insert(identity),
            "the same strategy instance was added to this pipeline more than once"
        );
        self.strategies.push(strategy);
        self
    }

    /// Consumes the accumulated strategies into an immutable pipeline. An empty
    /// builder produces a no-op pipeline; a single strategy is not special-cased
    /// further than that — it is simply a pipeline of length one.
    pub fn build(&mut self) -> ResiliencePipeline<T, E> {
        assert!(
            !self.built,
            "pipeline builder used after build(): builders are single-use"
        );
        self.built = true;
        ResiliencePipeline {
            strategies: Arc::from(std::mem::take(&mut self.strategies)),
        }
    }
}

impl<T, E> Default for ResiliencePipelineBuilder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
