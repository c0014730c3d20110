use std::time::{Duration, Instant};

use resilience_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum BulkheadEvent {
    CallPermitted {
        pattern_name: String,
        timestamp: Instant,
        concurrent_calls: usize,
    },
    CallQueued {
        pattern_name: String,
        timestamp: Instant,
        queue_depth: usize,
    },
    CallRejected {
        pattern_name: String,
        timestamp: Instant,
        max_concurrent_calls: usize,
    },
    CallFinished {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
    CallFailed {
        pattern_name: String,
        timestamp: Instant,
        duration: Duration,
    },
}

impl BulkheadEvent {
    fn name(&self) -> &str {
        match self {
            BulkheadEvent::CallPermitted { pattern_name, .. } => pattern_name,
            BulkheadEvent::CallQueued { pattern_name, .. } => pattern_name,
            BulkheadEvent::CallRejected { pattern_name, .. } => pattern_name,
            BulkheadEvent::CallFinished { pattern_name, .. } => pattern_name,
            BulkheadEvent::CallFailed { pattern_name, .. } => pattern_name,
        }
    }
}

impl ResilienceEvent for BulkheadEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BulkheadEvent::CallPermitted { .. } => "call_permitted",
            BulkheadEvent::CallQueued { .. } => "call_queued",
            BulkheadEvent::CallRejected { .. } => "call_rejected",
            BulkheadEvent::CallFinished { .. } => "call_finished",
            BulkheadEvent::CallFailed { .. } => "call_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BulkheadEvent::CallPermitted { timestamp, .. } => *timestamp,
            BulkheadEvent::CallQueued { timestamp, .. } => *timestamp,
            BulkheadEvent::CallRejected { timestamp, .. } => *timestamp,
            BulkheadEvent::CallFinished { timestamp, .. } => *timestamp,
            BulkheadEvent::CallFailed { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
