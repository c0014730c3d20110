use resilience_core::{EventListeners, FnListener, ValidationError, Validator};

use crate::events::BulkheadEvent;

pub struct BulkheadConfig {
    pub(crate) name: String,
    pub(crate) max_parallelization: usize,
    pub(crate) max_queuing: usize,
    pub(crate) event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfig {
    pub fn builder() -> BulkheadConfigBuilder {
        BulkheadConfigBuilder::new()
    }
}

pub struct BulkheadConfigBuilder {
    name: String,
    max_parallelization: usize,
    max_queuing: usize,
    event_listeners: EventListeners<BulkheadEvent>,
}

impl BulkheadConfigBuilder {
    pub fn new() -> Self {
        Self {
            name: String::from("<unnamed>"),
            max_parallelization: 10,
            max_queuing: 0,
            event_listeners: EventListeners::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Maximum number of calls allowed to run concurrently. Default: 10.
    pub fn max_parallelization(mut self, max: usize) -> Self {
        self.max_parallelization = max;
        self
    }

    /// Maximum number of calls allowed to wait for a free slot once parallelization is
    /// saturated. A call arriving when the queue is also full is rejected immediately.
    /// Default: 0 (no queuing; reject as soon as parallelization is saturated).
    pub fn max_queuing(mut self, max: usize) -> Self {
        self.max_queuing = max;
        self
    }

    pub fn on_call_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event: &BulkheadEvent| {
            if matches!(event, BulkheadEvent::CallRejected { .. }) {
                f();
            }
        }));
        self
    }

    pub fn build(self) -> Result<BulkheadConfig, ValidationError> {
        let mut validator = Validator::new(&self.name);
        validator.check(self.max_parallelization >= 1, "max_parallelization must be at least 1");
        validator.finish()?;

        Ok(BulkheadConfig {
            name: self.name,
            max_parallelization: self.max_parallelization,
            max_queuing: self.max_queuing,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for BulkheadConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
