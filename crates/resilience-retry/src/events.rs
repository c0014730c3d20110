use std::time::{Duration, Instant};

use resilience_core::ResilienceEvent;

/// Observable moments in a retry strategy's lifecycle.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// The wrapped operation succeeded, whether on the first attempt or a later one.
    Success {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
    },
    /// A handled outcome is about to be retried after `delay`.
    Retry {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// The attempt budget was exhausted; the last handled outcome is being returned.
    AttemptsExhausted {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// The outcome was not handled by `should_handle`; returned without retrying.
    NotHandled {
        pattern_name: String,
        timestamp: Instant,
    },
    /// A retry was skipped because the shared retry budget had no tokens left.
    BudgetExhausted {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
    },
    /// Cancellation was observed while waiting out the backoff delay.
    CanceledDuringBackoff {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
    },
}

impl RetryEvent {
    fn name(&self) -> &str {
        match self {
            RetryEvent::Success { pattern_name, .. } => pattern_name,
            RetryEvent::Retry { pattern_name, .. } => pattern_name,
            RetryEvent::AttemptsExhausted { pattern_name, .. } => pattern_name,
            RetryEvent::NotHandled { pattern_name, .. } => pattern_name,
            RetryEvent::BudgetExhausted { pattern_name, .. } => pattern_name,
            RetryEvent::CanceledDuringBackoff { pattern_name, .. } => pattern_name,
        }
    }
}

impl ResilienceEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Success { .. } => "success",
            RetryEvent::Retry { .. } => "retry",
            RetryEvent::AttemptsExhausted { .. } => "attempts_exhausted",
            RetryEvent::NotHandled { .. } => "not_handled",
            RetryEvent::BudgetExhausted { .. } => "budget_exhausted",
            RetryEvent::CanceledDuringBackoff { .. } => "canceled_during_backoff",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Success { timestamp, .. } => *timestamp,
            RetryEvent::Retry { timestamp, .. } => *timestamp,
            RetryEvent::AttemptsExhausted { timestamp, .. } => *timestamp,
            RetryEvent::NotHandled { timestamp, .. } => *timestamp,
            RetryEvent::BudgetExhausted { timestamp, .. } => *timestamp,
            RetryEvent::CanceledDuringBackoff { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
