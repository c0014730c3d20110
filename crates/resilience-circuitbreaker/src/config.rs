use std::time::Duration;

use resilience_core::{EventListeners, FnListener, ValidationError, Validator};

use crate::circuit::CircuitState;
use crate::events::CircuitBreakerEvent;

/// The breaker flavor used to decide when to open. `CountBased`/`TimeBased` are the
/// Resilience4j-style rolling window: the circuit opens once a failure (or slow-call)
/// rate crosses a threshold over the last N calls or the last W of wall-clock time.
/// `ConsecutiveCount` is the simpler flavor: the circuit opens as soon as
/// `consecutive_failure_threshold` *consecutive* handled outcomes land while closed,
/// with the counter reset by any non-handled outcome in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidingWindowType {
    CountBased,
    TimeBased,
    ConsecutiveCount,
}

pub struct CircuitBreakerConfig {
    pub(crate) name: String,
    pub(crate) failure_rate_threshold: f64,
    pub(crate) sliding_window_type: SlidingWindowType,
    pub(crate) sliding_window_size: usize,
    pub(crate) sliding_window_duration: Option<Duration>,
    pub(crate) bucket_count: usize,
    pub(crate) consecutive_failure_threshold: usize,
    pub(crate) wait_duration_in_open: Duration,
    pub(crate) permitted_calls_in_half_open: usize,
    pub(crate) minimum_number_of_calls: usize,
    pub(crate) slow_call_duration_threshold: Option<Duration>,
    pub(crate) slow_call_rate_threshold: f64,
    pub(crate) event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl std::fmt::Debug for CircuitBreakerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerConfig")
            .field("name", &self.name)
            .field("failure_rate_threshold", &self.failure_rate_threshold)
            .field("sliding_window_type", &self.sliding_window_type)
            .field("sliding_window_size", &self.sliding_window_size)
            .field("sliding_window_duration", &self.sliding_window_duration)
            .field("bucket_count", &self.bucket_count)
            .field("consecutive_failure_threshold", &self.consecutive_failure_threshold)
            .field("wait_duration_in_open", &self.wait_duration_in_open)
            .field("permitted_calls_in_half_open", &self.permitted_calls_in_half_open)
            .field("minimum_number_of_calls", &self.minimum_number_of_calls)
            .field("slow_call_duration_threshold", &self.slow_call_duration_threshold)
            .field("slow_call_rate_threshold", &self.slow_call_rate_threshold)
            .finish_non_exhaustive()
    }
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::new()
    }
}

pub struct CircuitBreakerConfigBuilder {
    name: String,
    failure_rate_threshold: f64,
    sliding_window_type: SlidingWindowType,
    sliding_window_size: usize,
    sliding_window_duration: Option<Duration>,
    bucket_count: usize,
    consecutive_failure_threshold: usize,
    wait_duration_in_open: Duration,
    permitted_calls_in_half_open: usize,
    minimum_number_of_calls: Option<usize>,
    slow_call_duration_threshold: Option<Duration>,
    slow_call_rate_threshold: f64,
    event_listeners: EventListeners<CircuitBreakerEvent>,
}

impl CircuitBreakerConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            failure_rate_threshold: 0.5,
            sliding_window_type: SlidingWindowType::CountBased,
            sliding_window_size: 100,
            sliding_window_duration: None,
            bucket_count: 10,
            consecutive_failure_threshold: 5,
            wait_duration_in_open: Duration::from_secs(30),
            permitted_calls_in_half_open: 1,
            minimum_number_of_calls: None,
            slow_call_duration_threshold: None,
            slow_call_rate_threshold: 1.0,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Default: 0.5
    pub fn failure_rate_threshold(mut self, rate: f64) -> Self {
        self.failure_rate_threshold = rate;
        self
    }

    /// Default: CountBased
    pub fn sliding_window_type(mut self, window_type: SlidingWindowType) -> Self {
        self.sliding_window_type = window_type;
        self
    }

    /// Default: 100
    pub fn sliding_window_size(mut self, size: usize) -> Self {
        self.sliding_window_size = size;
        self
    }

    pub fn sliding_window_duration(mut self, duration: Duration) -> Self {
        self.sliding_window_duration = Some(duration);
        self
    }

    /// Number of fixed-width buckets the time-based window is partitioned into.
    /// Must be at least 10. Default: 10.
    pub fn bucket_count(mut self, count: usize) -> Self {
        self.bucket_count = count;
        self
    }

    /// Number of consecutive handled outcomes that open the circuit when
    /// `sliding_window_type` is `ConsecutiveCount`. Default: 5.
    pub fn consecutive_failure_threshold(mut self, n: usize) -> Self {
        self.consecutive_failure_threshold = n;
        self
    }

    /// Default: 30s
    pub fn wait_duration_in_open(mut self, duration: Duration) -> Self {
        self.wait_duration_in_open = duration;
        self
    }

    /// Default: 1
    pub fn permitted_calls_in_half_open(mut self, n: usize) -> Self {
        self.permitted_calls_in_half_open = n;
        self
    }

    /// Default: same as sliding_window_size
    pub fn minimum_number_of_calls(mut self, n: usize) -> Self {
        self.minimum_number_of_calls = Some(n);
        self
    }

    pub fn slow_call_duration_threshold(mut self, duration: Duration) -> Self {
        self.slow_call_duration_threshold = Some(duration);
        self
    }

    /// Default: 1.0 (effectively disabled)
    pub fn slow_call_rate_threshold(mut self, rate: f64) -> Self {
        self.slow_call_rate_threshold = rate;
        self
    }

    pub fn on_state_transition<F>(mut self, f: F) -> Self
    where
        F: Fn(CircuitState, CircuitState) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::StateTransition { from_state, to_state, .. } = event {
                f(*from_state, *to_state);
            }
        }));
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if matches!(event, CircuitBreakerEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    pub fn on_slow_call<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &CircuitBreakerEvent| {
            if let CircuitBreakerEvent::SlowCallDetected { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    /// 50% failure threshold, 100-call window, 30s wait in open, 3 half-open probes.
    pub fn standard() -> Self {
        Self::new()
            .failure_rate_threshold(0.5)
            .sliding_window_size(100)
            .wait_duration_in_open(Duration::from_secs(30))
            .permitted_calls_in_half_open(3)
    }

    /// 25% failure threshold, 20-call window, 10s wait in open, 1 half-open probe.
    /// Opens quickly; for latency-sensitive calls where cascading failure is costlier
    /// than a false trip.
    pub fn fast_fail() -> Self {
        Self::new()
            .failure_rate_threshold(0.25)
            .sliding_window_size(20)
            .wait_duration_in_open(Duration::from_secs(10))
            .permitted_calls_in_half_open(1)
    }

    /// 75% failure threshold, 200-call window, 60s wait in open, 5 half-open probes.
    /// For dependencies with occasional transient issues that shouldn't trip the
    /// breaker over a handful of failures.
    pub fn tolerant() -> Self {
        Self::new()
            .failure_rate_threshold(0.75)
            .sliding_window_size(200)
            .wait_duration_in_open(Duration::from_secs(60))
            .permitted_calls_in_half_open(5)
    }

    pub fn build(self) -> Result<CircuitBreakerConfig, ValidationError> {
        let mut validator = Validator::new(&self.name);
        validator
            .check(
                self.sliding_window_type != SlidingWindowType::TimeBased || self.sliding_window_duration.is_some(),
                "sliding_window_duration must be set when using a time-based sliding window",
            )
            .check(
                self.sliding_window_type != SlidingWindowType::TimeBased || self.bucket_count >= 10,
                "bucket_count must be at least 10 when using a time-based sliding window",
            )
            .check(
                self.sliding_window_type != SlidingWindowType::ConsecutiveCount || self.consecutive_failure_threshold >= 1,
                "consecutive_failure_threshold must be at least 1",
            )
            .check(
                (0.0..=1.0).contains(&self.failure_rate_threshold),
                "failure_rate_threshold must be between 0.0 and 1.0",
            )
            .check(
                (0.0..=1.0).contains(&self.slow_call_rate_threshold),
                "slow_call_rate_threshold must be between 0.0 and 1.0",
            )
            .check(self.permitted_calls_in_half_open >= 1, "permitted_calls_in_half_open must be at least 1");
        validator.finish()?;

        Ok(CircuitBreakerConfig {
            name: self.name,
            failure_rate_threshold: self.failure_rate_threshold,
            sliding_window_type: self.sliding_window_type,
            sliding_window_size: self.sliding_window_size,
            sliding_window_duration: self.sliding_window_duration,
            bucket_count: self.bucket_count,
            consecutive_failure_threshold: self.consecutive_failure_threshold,
            wait_duration_in_open: self.wait_duration_in_open,
            permitted_calls_in_half_open: self.permitted_calls_in_half_open,
            minimum_number_of_calls: self.minimum_number_of_calls.unwrap_or(self.sliding_window_size),
            slow_call_duration_threshold: self.slow_call_duration_threshold,
            slow_call_rate_threshold: self.slow_call_rate_threshold,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for CircuitBreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
