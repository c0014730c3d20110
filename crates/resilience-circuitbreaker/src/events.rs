use std::time::{Duration, Instant};

use resilience_core::ResilienceEvent;

use crate::circuit::CircuitState;

#[derive(Debug, Clone)]
pub enum CircuitBreakerEvent {
    StateTransition {
        pattern_name: String,
        timestamp: Instant,
        from_state: CircuitState,
        to_state: CircuitState,
    },
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    SuccessRecorded {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    FailureRecorded {
        pattern_name: String,
        timestamp: Instant,
        state: CircuitState,
    },
    SlowCallDetected {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
        state: CircuitState,
    },
}

impl CircuitBreakerEvent {
    fn name(&self) -> &str {
        match self {
            CircuitBreakerEvent::StateTransition { pattern_name, .. } => pattern_name,
            CircuitBreakerEvent::CallPermitted { pattern_name, .. } => pattern_name,
            CircuitBreakerEvent::CallRejected { pattern_name, .. } => pattern_name,
            CircuitBreakerEvent::SuccessRecorded { pattern_name, .. } => pattern_name,
            CircuitBreakerEvent::FailureRecorded { pattern_name, .. } => pattern_name,
            CircuitBreakerEvent::SlowCallDetected { pattern_name, .. } => pattern_name,
        }
    }
}

impl ResilienceEvent for CircuitBreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CircuitBreakerEvent::StateTransition { .. } => "state_transition",
            CircuitBreakerEvent::CallPermitted { .. } => "call_permitted",
            CircuitBreakerEvent::CallRejected { .. } => "call_rejected",
            CircuitBreakerEvent::SuccessRecorded { .. } => "success_recorded",
            CircuitBreakerEvent::FailureRecorded { .. } => "failure_recorded",
            CircuitBreakerEvent::SlowCallDetected { .. } => "slow_call_detected",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CircuitBreakerEvent::StateTransition { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::CallPermitted { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::CallRejected { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::SuccessRecorded { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
            CircuitBreakerEvent::SlowCallDetected { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
