use std::sync::Arc;
use std::time::Duration;

use resilience_core::{EventListeners, FnListener, Outcome, ValidationError, Validator};

use crate::events::HedgeEvent;

/// Spacing between the primary attempt and each subsequent speculative attempt.
/// `Immediate` spawns every attempt at once; `Staggered` delays hedge `i` (0-indexed,
/// 0 = first hedge) by the function's result.
#[derive(Clone)]
pub enum HedgeDelay {
    Immediate,
    Staggered(Arc<dyn Fn(usize) -> Duration + Send + Sync>),
}

impl HedgeDelay {
    pub fn linear(base: Duration, increment: Duration) -> Self {
        HedgeDelay::Staggered(Arc::new(move |hedge_index| base + increment * (hedge_index as u32)))
    }

    pub fn constant(delay: Duration) -> Self {
        HedgeDelay::Staggered(Arc::new(move |_| delay))
    }

    pub(crate) fn delay_for(&self, hedge_index: usize) -> Duration {
        match self {
            HedgeDelay::Immediate => Duration::ZERO,
            HedgeDelay::Staggered(f) => f(hedge_index),
        }
    }
}

pub type ShouldHandle<T, E> = Arc<dyn Fn(&Outcome<T, E>) -> bool + Send + Sync>;

pub struct HedgeConfig<T, E> {
    pub(crate) name: String,
    pub(crate) max_attempts: usize,
    pub(crate) delay: HedgeDelay,
    pub(crate) should_handle: ShouldHandle<T, E>,
    pub(crate) event_listeners: EventListeners<HedgeEvent>,
}

impl<T, E> Clone for HedgeConfig<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            max_attempts: self.max_attempts,
            delay: self.delay.clone(),
            should_handle: self.should_handle.clone(),
            event_listeners: self.event_listeners.clone(),
        }
    }
}

pub struct HedgeConfigBuilder<T, E> {
    name: String,
    max_attempts: usize,
    delay: HedgeDelay,
    should_handle: Option<ShouldHandle<T, E>>,
    event_listeners: EventListeners<HedgeEvent>,
}

impl<T, E> HedgeConfigBuilder<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_attempts: 2,
            delay: HedgeDelay::linear(Duration::from_millis(100), Duration::from_millis(100)),
            should_handle: None,
            event_listeners: EventListeners::new(),
        }
    }

    /// Total attempts including the primary. Default: 2 (one hedge).
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn delay(mut self, delay: HedgeDelay) -> Self {
        self.delay = delay;
        self
    }

    pub fn should_handle<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Outcome<T, E>) -> bool + Send + Sync + 'static,
    {
        self.should_handle = Some(Arc::new(predicate));
        self
    }

    pub fn on_hedge_started<F>(mut self, f: F) -> Self
    where
        F: Fn(usize, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &HedgeEvent| {
            if let HedgeEvent::HedgeStarted { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    pub fn build(self) -> Result<HedgeConfig<T, E>, ValidationError> {
        let mut validator = Validator::new(&self.name);
        validator.check(self.max_attempts >= 1, "max_attempts must be at least 1");
        validator.finish()?;

        Ok(HedgeConfig {
            name: self.name,
            max_attempts: self.max_attempts,
            delay: self.delay,
            should_handle: self.should_handle.unwrap_or_else(|| Arc::new(|outcome| outcome.is_exception())),
            event_listeners: self.event_listeners,
        })
    }
}
