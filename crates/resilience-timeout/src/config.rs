use std::time::Duration;

use resilience_core::{EventListeners, FnListener, ValidationError, Validator};

use crate::events::TimeoutEvent;

/// Optimistic mode signals the wrapped operation's linked cancellation token and
/// waits for it to return on its own; pessimistic mode runs the operation on a
/// detached task and, once the deadline elapses, stops waiting on it and discards
/// whatever it eventually returns, regardless of whether it observes cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutMode {
    Optimistic,
    Pessimistic,
}

pub struct TimeoutConfig {
    pub(crate) name: String,
    pub(crate) timeout_duration: Duration,
    pub(crate) mode: TimeoutMode,
    pub(crate) event_listeners: EventListeners<TimeoutEvent>,
}

impl TimeoutConfig {
    pub fn builder() -> TimeoutConfigBuilder {
        TimeoutConfigBuilder::new()
    }
}

pub struct TimeoutConfigBuilder {
    name: String,
    timeout_duration: Duration,
    mode: TimeoutMode,
    event_listeners: EventListeners<TimeoutEvent>,
}

impl TimeoutConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            timeout_duration: Duration::from_secs(1),
            mode: TimeoutMode::Pessimistic,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn timeout_duration(mut self, duration: Duration) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// `Duration::MAX` disables the strategy: `next` runs with no deadline, no child
    /// cancellation token, and no detached task.
    pub fn no_timeout(mut self) -> Self {
        self.timeout_duration = Duration::MAX;
        self
    }

    /// Default: Pessimistic
    pub fn mode(mut self, mode: TimeoutMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &TimeoutEvent| {
            if let TimeoutEvent::Success { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &TimeoutEvent| {
            if let TimeoutEvent::Error { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    pub fn on_timeout<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &TimeoutEvent| {
            if matches!(event, TimeoutEvent::Timeout { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> Result<TimeoutConfig, ValidationError> {
        let mut validator = Validator::new(&self.name);
        validator.check(self.timeout_duration > Duration::ZERO, "timeout_duration must be greater than zero");
        validator.finish()?;

        Ok(TimeoutConfig {
            name: self.name,
            timeout_duration: self.timeout_duration,
            mode: self.mode,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for TimeoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
