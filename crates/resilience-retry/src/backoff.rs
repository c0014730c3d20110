//! Backoff strategies: how long to wait before the next retry attempt.

use std::sync::Arc;
use std::time::Duration;

use resilience_core::UniformSource;

/// Computes the delay before a given retry attempt (0-indexed: the first retry is
/// attempt 0).
pub trait IntervalFunction: Send + Sync {
    fn next_interval(&self, attempt: usize) -> Duration;
}

/// Always waits the same duration.
#[derive(Debug, Clone)]
pub struct FixedInterval {
    duration: Duration,
}

impl FixedInterval {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl IntervalFunction for FixedInterval {
    fn next_interval(&self, _attempt: usize) -> Duration {
        self.duration
    }
}

/// Grows the delay by a fixed amount per attempt: `base + attempt * increment`.
#[derive(Debug, Clone)]
pub struct LinearInterval {
    base: Duration,
    increment: Duration,
    max: Option<Duration>,
}

impl LinearInterval {
    pub fn new(base: Duration, increment: Duration) -> Self {
        Self {
            base,
            increment,
            max: None,
        }
    }

    pub fn max_interval(mut self, max: Duration) -> Self {
        self.max = Some(max);
        self
    }
}

impl IntervalFunction for LinearInterval {
    fn next_interval(&self, attempt: usize) -> Duration {
        let interval = self.base + self.increment * (attempt as u32);
        match self.max {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// Exponential backoff: `base * multiplier^attempt`, capped at an optional maximum.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_interval: Duration,
    multiplier: f64,
    max_interval: Option<Duration>,
}

impl ExponentialBackoff {
    pub fn new(initial_interval: Duration) -> Self {
        Self {
            initial_interval,
            multiplier: 2.0,
            max_interval: None,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn max_interval(mut self, max_interval: Duration) -> Self {
        self.max_interval = Some(max_interval);
        self
    }
}

impl IntervalFunction for ExponentialBackoff {
    fn next_interval(&self, attempt: usize) -> Duration {
        let interval = self
            .initial_interval
            .mul_f64(self.multiplier.powi(attempt as i32));
        match self.max_interval {
            Some(max) => interval.min(max),
            None => interval,
        }
    }
}

/// Decorrelated jitter, as described by AWS's "Exponential Backoff And Jitter":
/// `delay = uniform(base_delay, min(max_delay, prev_delay * 3))`. Each call advances
/// an internal `prev_delay`, so instances are stateful and must not be shared across
/// unrelated retry loops; the retry strategy creates one per call.
pub struct DecorrelatedJitter {
    base_delay: Duration,
    max_delay: Duration,
    source: Arc<dyn UniformSource>,
    prev_delay: std::sync::Mutex<Duration>,
}

impl DecorrelatedJitter {
    pub fn new(base_delay: Duration, max_delay: Duration, source: Arc<dyn UniformSource>) -> Self {
        Self {
            base_delay,
            max_delay,
            source,
            prev_delay: std::sync::Mutex::new(base_delay),
        }
    }

    pub fn next_delay(&self) -> Duration {
        let mut prev_delay = self.prev_delay.lock().unwrap_or_else(|p| p.into_inner());
        let ceiling = self.max_delay.min(*prev_delay * 3).max(self.base_delay);
        let span = ceiling.saturating_sub(self.base_delay);
        let delay = self.base_delay + span.mul_f64(self.source.uniform());
        *prev_delay = delay;
        delay
    }
}

/// Wraps a plain closure as an [`IntervalFunction`], for callers that need a custom
/// backoff shape not covered by the built-in strategies.
pub struct FnInterval<F> {
    f: F,
}

impl<F> FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> IntervalFunction for FnInterval<F>
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    fn next_interval(&self, attempt: usize) -> Duration {
        (self.f)(attempt)
    }
}
