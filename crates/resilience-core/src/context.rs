use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::properties::PropertyBag;

/// Per-execution state threaded through every strategy in a pipeline.
///
/// A context is created at the outer boundary of a call and released when the call
/// returns. It carries the cancellation signal, an optional logical operation name,
/// whether the caller entered synchronously, and a property bag for strategy-specific
/// out-of-band data. Callers must not retain a context past the call it was created
/// for — see [`ContextPool`] for the pooled acquisition pattern.
pub struct ExecutionContext {
    cancellation: CancellationToken,
    operation_key: Option<String>,
    is_synchronous: bool,
    continue_on_captured_context: bool,
    properties: PropertyBag,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            operation_key: None,
            is_synchronous: false,
            continue_on_captured_context: false,
            properties: PropertyBag::new(),
        }
    }

    pub fn with_operation_key(mut self, key: impl Into<String>) -> Self {
        self.operation_key = Some(key.into());
        self
    }

    pub fn synchronous(mut self) -> Self {
        self.is_synchronous = true;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn operation_key(&self) -> Option<&str> {
        self.operation_key.as_deref()
    }

    pub fn set_operation_key(&mut self, key: impl Into<String>) {
        self.operation_key = Some(key.into());
    }

    pub fn is_synchronous(&self) -> bool {
        self.is_synchronous
    }

    pub fn continue_on_captured_context(&self) -> bool {
        self.continue_on_captured_context
    }

    pub fn set_continue_on_captured_context(&mut self, value: bool) {
        self.continue_on_captured_context = value;
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_canceled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyBag {
        &mut self.properties
    }

    /// A child context whose cancellation token is linked to this one: canceling the
    /// parent cancels the child, but canceling the child (e.g. a per-attempt timeout or
    /// a losing hedge) does not propagate upward. Used by timeout (optimistic mode) and
    /// hedging to scope cancellation to a single attempt.
    pub fn child(&self) -> Self {
        Self {
            cancellation: self.cancellation.child_token(),
            operation_key: self.operation_key.clone(),
            is_synchronous: self.is_synchronous,
            continue_on_captured_context: self.continue_on_captured_context,
            properties: PropertyBag::new(),
        }
    }

    /// Resets mutable state so a pooled context can be reused by an unrelated call.
    /// The cancellation token is replaced (a canceled token must never be handed to a
    /// fresh caller) and the property bag is cleared.
    fn reset(&mut self) {
        self.cancellation = CancellationToken::new();
        self.operation_key = None;
        self.is_synchronous = false;
        self.continue_on_captured_context = false;
        self.properties.clear();
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A free-list of reusable `ExecutionContext` values.
///
/// Pooling is a throughput optimization, not a correctness requirement — a fresh
/// `ExecutionContext::new()` is just as correct. `acquire` returns a guard that resets
/// and returns the context to the pool on drop, so callers never need to remember to
/// release it themselves.
pub struct ContextPool {
    free: Mutex<Vec<ExecutionContext>>,
}

impl ContextPool {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    pub fn acquire(&self) -> PooledContext<'_> {
        let context = self
            .free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop()
            .unwrap_or_default();
        PooledContext {
            pool: self,
            context: Some(context),
        }
    }

    fn release(&self, mut context: ExecutionContext) {
        context.reset();
        self.free
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(context);
    }
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by [`ContextPool::acquire`]. Derefs to `ExecutionContext`; on
/// drop, the context is reset and returned to the pool on every exit path, including
/// panics unwinding through the guard.
pub struct PooledContext<'a> {
    pool: &'a ContextPool,
    context: Option<ExecutionContext>,
}

impl std::ops::Deref for PooledContext<'_> {
    type Target = ExecutionContext;
    fn deref(&self) -> &Self::Target {
        self.context.as_ref().expect("context taken before drop")
    }
}

impl std::ops::DerefMut for PooledContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.context.as_mut().expect("context taken before drop")
    }
}

impl Drop for PooledContext<'_> {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            self.pool.release(context);
        }
    }
}

/// Runs a future to completion from synchronous code, unifying the sync and async
/// execution surfaces required at the outer boundary of a pipeline. Prefers the
/// ambient tokio runtime if one is active on this thread; otherwise builds a throwaway
/// current-thread runtime for the duration of the call.
pub fn block_on<F: std::future::Future>(future: F) -> F::Output {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle.block_on(future),
        Err(_) => tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("failed to start a runtime for a blocking execution")
            .block_on(future),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_context_resets_on_release() {
        let pool = ContextPool::new();
        {
            let mut ctx = pool.acquire();
            ctx.set_operation_key("first");
            ctx.cancel();
            assert!(ctx.is_canceled());
        }
        let ctx = pool.acquire();
        assert_eq!(ctx.operation_key(), None);
        assert!(!ctx.is_canceled());
    }

    #[test]
    fn child_cancellation_does_not_propagate_upward() {
        let parent = ExecutionContext::new();
        let child = parent.child();
        child.cancel();
        assert!(child.is_canceled());
        assert!(!parent.is_canceled());
    }

    #[test]
    fn parent_cancellation_propagates_to_child() {
        let parent = ExecutionContext::new();
        let child = parent.child();
        parent.cancel();
        assert!(child.is_canceled());
    }

    #[tokio::test]
    async fn block_on_inside_an_ambient_runtime_does_not_deadlock() {
        let value = tokio::task::spawn_blocking(|| block_on(async { 1 + 1 }))
            .await
            .unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn block_on_outside_any_runtime_builds_its_own() {
        assert_eq!(block_on(async { 21 * 2 }), 42);
    }
}
