use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Abstracts "now" so strategies with time-based windows (the circuit breaker's
/// rolling window, retry backoff) can be driven deterministically in unit tests
/// without real sleeps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only advances when told to, for tests that need exact control over
/// elapsed time (e.g. sampling-window bucket boundaries).
pub struct FakeClock {
    base: Instant,
    offset_millis: AtomicU64,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            base: Instant::now(),
            offset_millis: AtomicU64::new(0),
        })
    }

    pub fn advance(&self, duration: Duration) {
        self.offset_millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_millis.load(Ordering::SeqCst))
    }
}

/// A source of uniform randomness in `[0, 1)`, injectable so retry's decorrelated
/// jitter can be tested with deterministic sequences instead of real randomness.
pub trait UniformSource: Send + Sync {
    fn uniform(&self) -> f64;
}

#[derive(Clone, Copy, Default)]
pub struct ThreadRngSource;

impl UniformSource for ThreadRngSource {
    fn uniform(&self) -> f64 {
        use rand::Rng;
        rand::rng().random::<f64>()
    }
}

/// Replays a fixed, cyclic sequence of values — useful for asserting an exact jitter
/// calculation in a test without depending on `rand`'s output.
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: std::sync::atomic::AtomicUsize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "scripted source needs at least one value");
        Self {
            values,
            cursor: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl UniformSource for ScriptedSource {
    fn uniform(&self) -> f64 {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.values.len();
        self.values[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_only_advances_when_told() {
        let clock = FakeClock::new();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now(), t0 + Duration::from_millis(500));
    }

    #[test]
    fn scripted_source_cycles() {
        let source = ScriptedSource::new(vec![0.1, 0.9]);
        assert_eq!(source.uniform(), 0.1);
        assert_eq!(source.uniform(), 0.9);
        assert_eq!(source.uniform(), 0.1);
    }
}
