use std::time::{Duration, Instant};

use resilience_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum HedgeEvent {
    PrimarySucceeded {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
        hedges_aborted: usize,
    },
    HedgeStarted {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    HedgeSucceeded {
        pattern_name: String,
        timestamp: Instant,
        attempt: usize,
        duration: Duration,
    },
    AllAttemptsFailed {
        pattern_name: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl HedgeEvent {
    fn name(&self) -> &str {
        match self {
            HedgeEvent::PrimarySucceeded { pattern_name, .. } => pattern_name,
            HedgeEvent::HedgeStarted { pattern_name, .. } => pattern_name,
            HedgeEvent::HedgeSucceeded { pattern_name, .. } => pattern_name,
            HedgeEvent::AllAttemptsFailed { pattern_name, .. } => pattern_name,
        }
    }
}

impl ResilienceEvent for HedgeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            HedgeEvent::PrimarySucceeded { .. } => "primary_succeeded",
            HedgeEvent::HedgeStarted { .. } => "hedge_started",
            HedgeEvent::HedgeSucceeded { .. } => "hedge_succeeded",
            HedgeEvent::AllAttemptsFailed { .. } => "all_attempts_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            HedgeEvent::PrimarySucceeded { timestamp, .. } => *timestamp,
            HedgeEvent::HedgeStarted { timestamp, .. } => *timestamp,
            HedgeEvent::HedgeSucceeded { timestamp, .. } => *timestamp,
            HedgeEvent::AllAttemptsFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
