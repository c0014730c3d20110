use std::time::Instant;

use resilience_core::ResilienceEvent;

#[derive(Debug, Clone)]
pub enum CacheEvent {
    Hit { pattern_name: String, timestamp: Instant, key: String },
    Miss { pattern_name: String, timestamp: Instant, key: String },
    Put { pattern_name: String, timestamp: Instant, key: String },
    GetError { pattern_name: String, timestamp: Instant, key: String, message: String },
    PutError { pattern_name: String, timestamp: Instant, key: String, message: String },
}

impl CacheEvent {
    fn name(&self) -> &str {
        match self {
            CacheEvent::Hit { pattern_name, .. } => pattern_name,
            CacheEvent::Miss { pattern_name, .. } => pattern_name,
            CacheEvent::Put { pattern_name, .. } => pattern_name,
            CacheEvent::GetError { pattern_name, .. } => pattern_name,
            CacheEvent::PutError { pattern_name, .. } => pattern_name,
        }
    }
}

impl ResilienceEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "hit",
            CacheEvent::Miss { .. } => "miss",
            CacheEvent::Put { .. } => "put",
            CacheEvent::GetError { .. } => "get_error",
            CacheEvent::PutError { .. } => "put_error",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. } => *timestamp,
            CacheEvent::Miss { timestamp, .. } => *timestamp,
            CacheEvent::Put { timestamp, .. } => *timestamp,
            CacheEvent::GetError { timestamp, .. } => *timestamp,
            CacheEvent::PutError { timestamp, .. } => *timestamp,
        }
    }

    fn pattern_name(&self) -> &str {
        self.name()
    }
}
