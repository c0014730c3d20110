//! Open, ordered event fan-out shared by every strategy crate.
//!
//! Each strategy defines its own event enum (e.g. `CircuitBreakerEvent`,
//! `RetryEvent`) implementing [`ResilienceEvent`], and holds an [`EventListeners<E>`]
//! in its config. Listeners are plain closures or trait objects; a panicking listener
//! is isolated so it cannot take down the call it was observing.

use std::fmt;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

/// A single observable moment in a strategy's lifecycle.
pub trait ResilienceEvent: Send + Sync + fmt::Debug {
    /// A short, stable name for this variant (e.g. `"state_transition"`), used in
    /// log fields and metric labels.
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> Instant;
    /// The name given to the strategy instance that emitted this event.
    fn pattern_name(&self) -> &str;
}

pub trait EventListener<E: ResilienceEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// An ordered list of listeners for one event type, shared (via `Clone`) across every
/// strategy instance built from the same config.
#[derive(Clone)]
pub struct EventListeners<E: ResilienceEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ResilienceEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L: EventListener<E> + 'static>(&mut self, listener: L) {
        self.listeners.push(Arc::new(listener));
    }

    /// Dispatches `event` to every listener in registration order. A listener that
    /// panics is caught and logged (when the `tracing` feature is enabled) or
    /// recorded as a metric (when `metrics` is enabled); dispatch continues to the
    /// remaining listeners either way — a broken observer must never affect the
    /// outcome of the call it is observing.
    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let result =
                panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if let Err(_panic_payload) = result {
                #[cfg(feature = "tracing")]
                log_listener_panic(index, event, _panic_payload.as_ref());
                #[cfg(feature = "metrics")]
                record_listener_panic_metric(event);
                #[cfg(not(any(feature = "tracing", feature = "metrics")))]
                let _ = index;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: ResilienceEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tracing")]
fn log_listener_panic<E: ResilienceEvent>(
    index: usize,
    event: &E,
    payload: &(dyn std::any::Any + Send),
) {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    tracing::warn!(
        listener_index = index,
        pattern = event.pattern_name(),
        event_type = event.event_type(),
        panic_message = %message,
        "event listener panicked; continuing dispatch"
    );
}

#[cfg(feature = "metrics")]
fn record_listener_panic_metric<E: ResilienceEvent>(event: &E) {
    metrics::counter!(
        "resilience_event_listener_panics_total",
        "pattern" => event.pattern_name().to_string(),
        "event_type" => event.event_type(),
    )
    .increment(1);
}

/// Adapts a plain closure into an [`EventListener`], so builders can expose
/// `on_x(|event| { ... })` hooks without requiring callers to implement the trait.
pub struct FnListener<E, F: Fn(&E) + Send + Sync> {
    f: F,
    _phantom: PhantomData<fn(&E)>,
}

impl<E, F: Fn(&E) + Send + Sync> FnListener<E, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: PhantomData,
        }
    }
}

impl<E: ResilienceEvent, F: Fn(&E) + Send + Sync> EventListener<E> for FnListener<E, F> {
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
