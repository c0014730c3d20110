use std::time::Instant;

use resilience_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum FallbackEvent {
    Success { pattern_name: String, timestamp: Instant },
    FailedAttempt { pattern_name: String, timestamp: Instant },
    Applied { pattern_name: String, timestamp: Instant },
    Skipped { pattern_name: String, timestamp: Instant },
}

impl ResilienceEvent for FallbackEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FallbackEvent::Success { .. } => "success",
            FallbackEvent::FailedAttempt { .. } => "failed_attempt",
            FallbackEvent::Applied { .. } => "applied",
            FallbackEvent::Skipped { .. } => "skipped",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            FallbackEvent::Success { timestamp, .. }
            | FallbackEvent::FailedAttempt { timestamp, .. }
            | FallbackEvent::Applied { timestamp, .. }
            | FallbackEvent::Skipped { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        match self {
            FallbackEvent::Success { pattern_name, .. }
            | FallbackEvent::FailedAttempt { pattern_name, .. }
            | FallbackEvent::Applied { pattern_name, .. }
            | FallbackEvent::Skipped { pattern_name, .. } => pattern_name,
        }
    }
}
