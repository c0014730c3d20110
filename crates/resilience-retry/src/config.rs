use std::sync::Arc;
use std::time::Duration;

use resilience_core::{Outcome, ResilienceError, ValidationError, Validator};

use crate::backoff::{ExponentialBackoff, FixedInterval, IntervalFunction, LinearInterval};
use crate::budget::RetryBudget;

/// How the delay between attempts grows. `Jittered` wraps decorrelated jitter around
/// whichever shape is chosen, per the AWS "Exponential Backoff And Jitter" scheme.
#[derive(Clone)]
pub enum BackoffMode {
    Constant(Duration),
    Linear { base: Duration, increment: Duration },
    Exponential { initial: Duration, multiplier: f64 },
    Jittered { base: Duration, max: Duration },
}

impl BackoffMode {
    pub(crate) fn interval_function(&self, max_delay: Option<Duration>) -> Arc<dyn IntervalFunction> {
        match self {
            BackoffMode::Constant(d) => Arc::new(FixedInterval::new(*d)),
            BackoffMode::Linear { base, increment } => {
                let mut linear = LinearInterval::new(*base, *increment);
                if let Some(max) = max_delay {
                    linear = linear.max_interval(max);
                }
                Arc::new(linear)
            }
            BackoffMode::Exponential { initial, multiplier } => {
                let mut exp = ExponentialBackoff::new(*initial).multiplier(*multiplier);
                if let Some(max) = max_delay {
                    exp = exp.max_interval(max);
                }
                Arc::new(exp)
            }
            BackoffMode::Jittered { .. } => {
                unreachable!("jittered mode is handled separately via DecorrelatedJitter")
            }
        }
    }
}

/// `E` here is the caller's inner error type; the predicate sees the wrapped
/// [`ResilienceError<E>`] the same way every other strategy in the family does, so a
/// `should_handle` written against `ResilienceError::BrokenCircuit` or similar from an
/// inner strategy still composes.
pub type ShouldHandle<T, E> = Arc<dyn Fn(&Outcome<T, ResilienceError<E>>) -> bool + Send + Sync>;
pub type OnRetry<T, E> = Arc<dyn Fn(&Outcome<T, ResilienceError<E>>, usize, Duration) + Send + Sync>;

pub struct RetryConfig<T, E> {
    pub(crate) name: String,
    pub(crate) max_attempts: usize,
    pub(crate) backoff_mode: BackoffMode,
    pub(crate) max_delay: Option<Duration>,
    pub(crate) should_handle: ShouldHandle<T, E>,
    pub(crate) on_retry: Option<OnRetry<T, E>>,
    pub(crate) budget: Option<Arc<dyn RetryBudget>>,
}

impl<T, E> std::fmt::Debug for RetryConfig<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("name", &self.name)
            .field("max_attempts", &self.max_attempts)
            .field("max_delay", &self.max_delay)
            .finish_non_exhaustive()
    }
}

impl<T, E> Clone for RetryConfig<T, E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            max_attempts: self.max_attempts,
            backoff_mode: self.backoff_mode.clone(),
            max_delay: self.max_delay,
            should_handle: self.should_handle.clone(),
            on_retry: self.on_retry.clone(),
            budget: self.budget.clone(),
        }
    }
}

pub struct RetryConfigBuilder<T, E> {
    name: String,
    max_attempts: usize,
    backoff_mode: BackoffMode,
    max_delay: Option<Duration>,
    should_handle: Option<ShouldHandle<T, E>>,
    on_retry: Option<OnRetry<T, E>>,
    budget: Option<Arc<dyn RetryBudget>>,
}

impl<T, E> RetryConfigBuilder<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_attempts: 3,
            backoff_mode: BackoffMode::Constant(Duration::from_millis(200)),
            max_delay: None,
            should_handle: None,
            on_retry: None,
            budget: None,
        }
    }

    /// Total attempts including the first, non-retried call. Default: 3.
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn backoff(mut self, mode: BackoffMode) -> Self {
        self.backoff_mode = mode;
        self
    }

    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Default (when unset): every `Exception` outcome is handled, every `Result` is not.
    pub fn should_handle<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Outcome<T, ResilienceError<E>>) -> bool + Send + Sync + 'static,
    {
        self.should_handle = Some(Arc::new(predicate));
        self
    }

    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Outcome<T, ResilienceError<E>>, usize, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    pub fn budget(mut self, budget: Arc<dyn RetryBudget>) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn build(self) -> Result<RetryConfig<T, E>, ValidationError> {
        let mut validator = Validator::new(&self.name);
        validator
            .check(self.max_attempts >= 1, "max_attempts must be at least 1")
            .check(
                match &self.backoff_mode {
                    BackoffMode::Exponential { multiplier, .. } => *multiplier > 1.0,
                    BackoffMode::Jittered { base, max } => base <= max,
                    _ => true,
                },
                "backoff configuration is internally inconsistent",
            );
        validator.finish()?;

        Ok(RetryConfig {
            name: self.name,
            max_attempts: self.max_attempts,
            backoff_mode: self.backoff_mode,
            max_delay: self.max_delay,
            should_handle: self
                .should_handle
                .unwrap_or_else(|| Arc::new(|outcome| outcome.is_exception())),
            on_retry: self.on_retry,
            budget: self.budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_attempts() {
        let err = RetryConfigBuilder::<(), String>::new("retry")
            .max_attempts(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn default_should_handle_treats_exceptions_as_handled() {
        let config = RetryConfigBuilder::<i32, String>::new("retry").build().unwrap();
        assert!((config.should_handle)(&Outcome::Exception(ResilienceError::Inner("boom".into()))));
        assert!(!(config.should_handle)(&Outcome::Result(1)));
    }
}
