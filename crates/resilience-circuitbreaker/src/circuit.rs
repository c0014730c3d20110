use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge, histogram};

use crate::config::{CircuitBreakerConfig, SlidingWindowType};
use crate::events::CircuitBreakerEvent;

/// The circuit breaker's state machine. `Isolated` is a manual override that rejects
/// every call until explicitly closed; it is not reachable through normal failure
/// accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
    Isolated = 3,
}

impl CircuitState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            3 => CircuitState::Isolated,
            _ => CircuitState::Closed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircuitMetrics {
    pub state: CircuitState,
    pub total_calls: usize,
    pub failure_count: usize,
    pub success_count: usize,
    pub slow_call_count: usize,
    pub failure_rate: f64,
    pub slow_call_rate: f64,
    pub time_since_state_change: Duration,
}

/// One slot of the time-based sliding window. `seq` is the absolute bucket index (see
/// [`Circuit::bucket_index`]) this slot's counts currently belong to; a write that lands
/// on a slot carrying a stale `seq` clears it first, which is how buckets older than the
/// window are evicted without a background sweep.
#[derive(Debug, Clone, Copy, Default)]
struct Bucket {
    seq: Option<u64>,
    total: usize,
    failures: usize,
    slow: usize,
}

pub(crate) struct Circuit {
    state: CircuitState,
    state_atomic: Arc<AtomicU8>,
    last_state_change: Instant,
    failure_count: usize,
    success_count: usize,
    total_count: usize,
    slow_call_count: usize,
    consecutive_failures: usize,
    /// Probes admitted in the current `HalfOpen` window whose completion hasn't been
    /// recorded yet. Folded into the admission check alongside `success_count +
    /// failure_count` so a second caller can't be admitted while the first probe is
    /// still in flight and hasn't updated those counters.
    half_open_in_flight: usize,
    buckets: Vec<Bucket>,
    window_start: Instant,
}

impl Circuit {
    pub(crate) fn new_with_atomic(state_atomic: Arc<AtomicU8>) -> Self {
        Self {
            state: CircuitState::Closed,
            state_atomic,
            last_state_change: Instant::now(),
            failure_count: 0,
            success_count: 0,
            total_count: 0,
            slow_call_count: 0,
            consecutive_failures: 0,
            half_open_in_flight: 0,
            buckets: Vec::new(),
            window_start: Instant::now(),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn metrics(&self, config: &CircuitBreakerConfig) -> CircuitMetrics {
        let (total_calls, failure_count, success_count, slow_call_count) = match config.sliding_window_type {
            SlidingWindowType::CountBased | SlidingWindowType::ConsecutiveCount => (
                self.total_count,
                self.failure_count,
                self.success_count,
                self.slow_call_count,
            ),
            SlidingWindowType::TimeBased => self.time_based_stats(config),
        };

        let failure_rate = if total_calls > 0 {
            failure_count as f64 / total_calls as f64
        } else {
            0.0
        };
        let slow_call_rate = if total_calls > 0 {
            slow_call_count as f64 / total_calls as f64
        } else {
            0.0
        };

        CircuitMetrics {
            state: self.state,
            total_calls,
            failure_count,
            success_count,
            slow_call_count,
            failure_rate,
            slow_call_rate,
            time_since_state_change: self.last_state_change.elapsed(),
        }
    }

    fn bucket_width(config: &CircuitBreakerConfig) -> Duration {
        config
            .sliding_window_duration
            .expect("TimeBased sliding window always carries a duration; enforced by build()")
            / config.bucket_count as u32
    }

    /// `floor((now - window_start) / bucket_width)`, monotonically increasing for the
    /// lifetime of the current window. Reducing it `% bucket_count` gives the ring slot;
    /// comparing it against a slot's stored `seq` is how stale buckets are detected.
    fn bucket_index(&self, config: &CircuitBreakerConfig) -> u64 {
        let bucket_width = Self::bucket_width(config);
        let elapsed = self.window_start.elapsed();
        (elapsed.as_nanos() / bucket_width.as_nanos().max(1)) as u64
    }

    fn ensure_buckets(&mut self, config: &CircuitBreakerConfig) {
        if self.buckets.len() != config.bucket_count {
            self.buckets = vec![Bucket::default(); config.bucket_count];
        }
    }

    fn record_bucket(&mut self, config: &CircuitBreakerConfig, is_failure: bool, is_slow: bool) {
        self.ensure_buckets(config);
        let absolute = self.bucket_index(config);
        let slot = (absolute % config.bucket_count as u64) as usize;
        let bucket = &mut self.buckets[slot];
        if bucket.seq != Some(absolute) {
            *bucket = Bucket {
                seq: Some(absolute),
                ..Bucket::default()
            };
        }
        bucket.total += 1;
        if is_failure {
            bucket.failures += 1;
        }
        if is_slow {
            bucket.slow += 1;
        }
    }

    fn time_based_stats(&self, config: &CircuitBreakerConfig) -> (usize, usize, usize, usize) {
        if self.buckets.is_empty() {
            return (0, 0, 0, 0);
        }
        let current = self.bucket_index(config);
        let oldest_valid = current.saturating_sub(config.bucket_count as u64 - 1);

        let mut total = 0;
        let mut failures = 0;
        let mut slow = 0;
        for bucket in &self.buckets {
            if let Some(seq) = bucket.seq {
                if seq >= oldest_valid && seq <= current {
                    total += bucket.total;
                    failures += bucket.failures;
                    slow += bucket.slow;
                }
            }
        }
        (total, failures, total - failures, slow)
    }

    pub fn record_success(&mut self, config: &CircuitBreakerConfig, duration: Duration) {
        if self.state == CircuitState::Isolated {
            return;
        }

        let is_slow = config
            .slow_call_duration_threshold
            .map(|threshold| duration >= threshold)
            .unwrap_or(false);
        let was_half_open = self.state == CircuitState::HalfOpen;

        match config.sliding_window_type {
            SlidingWindowType::CountBased | SlidingWindowType::ConsecutiveCount => {
                self.success_count += 1;
                self.total_count += 1;
                if is_slow {
                    self.slow_call_count += 1;
                }
                self.consecutive_failures = 0;
            }
            SlidingWindowType::TimeBased => self.record_bucket(config, false, is_slow),
        }

        if was_half_open {
            self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
        }

        if is_slow {
            self.emit_slow_call(config, duration);
        }
        config.event_listeners.emit(&CircuitBreakerEvent::SuccessRecorded {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "success").increment(1);
            histogram!("circuitbreaker_call_duration_seconds", "circuitbreaker" => config.name.clone())
                .record(duration.as_secs_f64());
        }

        match self.state {
            CircuitState::HalfOpen => {
                let success_count = match config.sliding_window_type {
                    SlidingWindowType::CountBased | SlidingWindowType::ConsecutiveCount => self.success_count,
                    SlidingWindowType::TimeBased => self.time_based_stats(config).2,
                };
                if success_count >= config.permitted_calls_in_half_open {
                    self.transition_to(CircuitState::Closed, config);
                }
            }
            _ => self.evaluate_window(config),
        }
    }

    pub fn record_failure(&mut self, config: &CircuitBreakerConfig, duration: Duration) {
        if self.state == CircuitState::Isolated {
            return;
        }

        let is_slow = config
            .slow_call_duration_threshold
            .map(|threshold| duration >= threshold)
            .unwrap_or(false);
        let was_half_open = self.state == CircuitState::HalfOpen;

        match config.sliding_window_type {
            SlidingWindowType::CountBased | SlidingWindowType::ConsecutiveCount => {
                self.failure_count += 1;
                self.total_count += 1;
                if is_slow {
                    self.slow_call_count += 1;
                }
                self.consecutive_failures += 1;
            }
            SlidingWindowType::TimeBased => self.record_bucket(config, true, is_slow),
        }

        if was_half_open {
            self.half_open_in_flight = self.half_open_in_flight.saturating_sub(1);
        }

        if is_slow {
            self.emit_slow_call(config, duration);
        }
        config.event_listeners.emit(&CircuitBreakerEvent::FailureRecorded {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("circuitbreaker_calls_total", "circuitbreaker" => config.name.clone(), "outcome" => "failure").increment(1);
            histogram!("circuitbreaker_call_duration_seconds", "circuitbreaker" => config.name.clone())
                .record(duration.as_secs_f64());
        }

        match self.state {
            CircuitState::HalfOpen => self.transition_to(CircuitState::Open, config),
            _ => self.evaluate_window(config),
        }
    }

    fn emit_slow_call(&self, config: &CircuitBreakerConfig, duration: Duration) {
        config.event_listeners.emit(&CircuitBreakerEvent::SlowCallDetected {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            duration,
            state: self.state,
        });

        #[cfg(feature = "metrics")]
        counter!("circuitbreaker_slow_calls_total", "circuitbreaker" => config.name.clone()).increment(1);
    }

    /// Admits or rejects a call for the current state. A half-open probe is admitted
    /// only while fewer than `permitted_calls_in_half_open` calls are already in flight
    /// or completed for this window. `half_open_in_flight` closes the gap between
    /// admission and the eventual `record_success`/`record_failure` call: those two
    /// counters only update once the wrapped call returns, but the circuit's lock is
    /// released for the duration of that call, so without an in-flight counter two
    /// concurrent callers would both observe `0 < permitted` and both be admitted. The
    /// increment here and the decrement in `record_success`/`record_failure` happen
    /// under the same lock the strategy holds for `try_acquire` and for recording, which
    /// makes this a compare-and-set: whichever caller increments first claims the slot.
    pub fn try_acquire(&mut self, config: &CircuitBreakerConfig) -> bool {
        match self.state {
            CircuitState::Closed => {
                self.emit_permitted(config);
                true
            }
            CircuitState::Isolated => {
                self.emit_rejected(config);
                false
            }
            CircuitState::Open => {
                if self.last_state_change.elapsed() >= config.wait_duration_in_open {
                    self.transition_to(CircuitState::HalfOpen, config);
                    self.half_open_in_flight += 1;
                    self.emit_permitted(config);
                    true
                } else {
                    self.emit_rejected(config);
                    false
                }
            }
            CircuitState::HalfOpen => {
                let in_flight_or_done = self.success_count + self.failure_count + self.half_open_in_flight;
                let permitted = in_flight_or_done < config.permitted_calls_in_half_open;
                if permitted {
                    self.half_open_in_flight += 1;
                    self.emit_permitted(config);
                } else {
                    self.emit_rejected(config);
                }
                permitted
            }
        }
    }

    fn emit_permitted(&self, config: &CircuitBreakerConfig) {
        config.event_listeners.emit(&CircuitBreakerEvent::CallPermitted {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });
    }

    fn emit_rejected(&self, config: &CircuitBreakerConfig) {
        config.event_listeners.emit(&CircuitBreakerEvent::CallRejected {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            state: self.state,
        });
    }

    /// Manual override: forces `Isolated`, rejecting every call regardless of
    /// accounting, until `close` is called.
    pub fn isolate(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Isolated, config);
    }

    /// Manual override: forces `Closed` and resets accounting, from any state
    /// including `Isolated`.
    pub fn close(&mut self, config: &CircuitBreakerConfig) {
        self.transition_to(CircuitState::Closed, config);
    }

    fn transition_to(&mut self, state: CircuitState, config: &CircuitBreakerConfig) {
        if self.state == state {
            return;
        }
        let from_state = self.state;

        config.event_listeners.emit(&CircuitBreakerEvent::StateTransition {
            pattern_name: config.name.clone(),
            timestamp: Instant::now(),
            from_state,
            to_state: state,
        });

        #[cfg(feature = "tracing")]
        tracing::info!(circuitbreaker = %config.name, from = ?from_state, to = ?state, "circuit state transition");

        #[cfg(feature = "metrics")]
        {
            counter!(
                "circuitbreaker_transitions_total",
                "circuitbreaker" => config.name.clone(),
                "from" => state_label(from_state),
                "to" => state_label(state)
            )
            .increment(1);
            gauge!("circuitbreaker_state", "circuitbreaker" => config.name.clone(), "state" => state_label(state)).set(1.0);
        }

        self.state = state;
        self.state_atomic.store(state as u8, Ordering::Release);
        self.last_state_change = Instant::now();
        self.success_count = 0;
        self.failure_count = 0;
        self.total_count = 0;
        self.slow_call_count = 0;
        self.consecutive_failures = 0;
        self.half_open_in_flight = 0;
        self.buckets.clear();
        self.window_start = Instant::now();
    }

    fn evaluate_window(&mut self, config: &CircuitBreakerConfig) {
        if config.sliding_window_type == SlidingWindowType::ConsecutiveCount {
            if self.consecutive_failures >= config.consecutive_failure_threshold {
                self.transition_to(CircuitState::Open, config);
            }
            return;
        }

        let (total_count, failure_count, _success_count, slow_call_count) = match config.sliding_window_type {
            SlidingWindowType::CountBased => (
                self.total_count,
                self.failure_count,
                self.success_count,
                self.slow_call_count,
            ),
            SlidingWindowType::TimeBased => self.time_based_stats(config),
            SlidingWindowType::ConsecutiveCount => unreachable!("handled above"),
        };

        if total_count < config.minimum_number_of_calls {
            return;
        }
        if config.sliding_window_type == SlidingWindowType::CountBased && total_count < config.sliding_window_size {
            return;
        }

        let failure_rate = failure_count as f64 / total_count as f64;
        let slow_call_rate = slow_call_count as f64 / total_count as f64;

        let should_open = failure_rate >= config.failure_rate_threshold
            || (config.slow_call_duration_threshold.is_some() && slow_call_rate >= config.slow_call_rate_threshold);

        if should_open {
            self.transition_to(CircuitState::Open, config);
        }
    }
}

#[cfg(feature = "metrics")]
fn state_label(state: CircuitState) -> &'static str {
    match state {
        CircuitState::Closed => "closed",
        CircuitState::Open => "open",
        CircuitState::HalfOpen => "half_open",
        CircuitState::Isolated => "isolated",
    }
}
