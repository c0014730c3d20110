use std::time::{Duration, Instant};

use resilience_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum TimeoutEvent {
    Success {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    Error {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    Timeout {
        pattern_name: String,
        timestamp: Instant,
        timeout_duration: Duration,
    },
}

impl TimeoutEvent {
    fn name(&self) -> &str {
        match self {
            TimeoutEvent::Success { pattern_name, .. } => pattern_name,
            TimeoutEvent::Error { pattern_name, .. } => pattern_name,
            TimeoutEvent::Timeout { pattern_name, .. } => pattern_name,
        }
    }
}

impl ResilienceEvent for TimeoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeoutEvent::Success { .. } => "success",
            TimeoutEvent::Error { .. } => "error",
            TimeoutEvent::Timeout { .. } => "timeout",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeoutEvent::Success { timestamp, .. } => *timestamp,
            TimeoutEvent::Error { timestamp, .. } => *timestamp,
            TimeoutEvent::Timeout { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
