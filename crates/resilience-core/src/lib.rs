//! Execution substrate shared by every strategy in the resilience pipeline:
//! the `Outcome` result carrier, the pooled `ExecutionContext`, the
//! `ResilienceStrategy`/pipeline composition contract, the unified error taxonomy, and
//! the event and time abstractions every strategy crate builds on.

mod context;
mod error;
mod events;
mod outcome;
mod pipeline;
mod properties;
mod strategy;
mod time;
mod validation;

pub use context::{block_on, ContextPool, ExecutionContext, PooledContext};
pub use error::ResilienceError;
pub use events::{BoxedEventListener, EventListener, EventListeners, FnListener, ResilienceEvent};
pub use outcome::{Outcome, Void};
pub use pipeline::{ResiliencePipeline, ResiliencePipelineBuilder};
pub use properties::PropertyBag;
pub use strategy::{FnNext, Next, PinFuture, ResilienceStrategy};
pub use time::{Clock, FakeClock, ScriptedSource, SystemClock, ThreadRngSource, UniformSource};
pub use validation::{ValidationError, Validator};

pub use tokio_util::sync::CancellationToken;
