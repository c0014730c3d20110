use std::sync::Arc;

use resilience_core::{EventListeners, ExecutionContext, FnListener, Outcome, ValidationError, Validator};

use crate::events::FallbackEvent;

pub type ShouldHandle<T, E> = Arc<dyn Fn(&Outcome<T, E>) -> bool + Send + Sync>;
pub type FallbackAction<T, E> = Arc<dyn Fn(&Outcome<T, E>, &ExecutionContext) -> T + Send + Sync>;

pub struct FallbackConfig<T, E> {
    pub(crate) name: String,
    pub(crate) action: FallbackAction<T, E>,
    pub(crate) should_handle: ShouldHandle<T, E>,
    pub(crate) event_listeners: EventListeners<FallbackEvent>,
}

impl<T, E> Clone for FallbackConfig<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            action: self.action.clone(),
            should_handle: self.should_handle.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

pub struct FallbackConfigBuilder<T, E> {
    name: String,
    action: FallbackAction<T, E>,
    should_handle: Option<ShouldHandle<T, E>>,
    event_listeners: EventListeners<FallbackEvent>,
}

impl<T, E> FallbackConfigBuilder<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Builds a config that substitutes a fixed, pre-computed value on every handled
    /// outcome.
    pub fn value(name: impl Into<String>, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(name, move |_outcome, _context| value.clone())
    }

    /// Builds a config that derives the substitute value from the handled outcome and
    /// the execution context.
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Outcome<T, E>, &ExecutionContext) -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            action: Arc::new(action),
            should_handle: None,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn should_handle<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Outcome<T, E>) -> bool + Send + Sync + 'static,
    {
        self.should_handle = Some(Arc::new(predicate));
        self
    }

    pub fn on_fallback<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &FallbackEvent| {
            if let FallbackEvent::Applied { .. } = event {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> Result<FallbackConfig<T, E>, ValidationError> {
        Validator::new(&self.name).finish()?;

        Ok(FallbackConfig {
            name: self.name,
            action: self.action,
            should_handle: self.should_handle.unwrap_or_else(|| Arc::new(|outcome| outcome.is_exception())),
            event_listeners: self.event_listeners,
        })
    }
}
