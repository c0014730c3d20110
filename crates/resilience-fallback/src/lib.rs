//! Fallback strategy: substitutes a degraded response for a handled outcome, leaving
//! everything else untouched.

mod config;
mod events;

pub use config::{FallbackAction, FallbackConfig, FallbackConfigBuilder, ShouldHandle};
pub use events::FallbackEvent;

use std::sync::Arc;
use std::time::Instant;

use resilience_core::{ExecutionContext, Next, Outcome, PinFuture, ResilienceStrategy};

pub struct Fallback<T, E> {
    config: FallbackConfig<T, E>,
}

impl<T, E> Fallback<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: FallbackConfig<T, E>) -> Self {
        Self { config }
    }
}

impl<T, E> ResilienceStrategy<T, E> for Fallback<T, E>
where
    T: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn execute(&self, next: Arc<dyn Next<T, E>>, context: ExecutionContext) -> PinFuture<(Outcome<T, E>, ExecutionContext)> {
        let config = self.config.clone();

        Box::pin(async move {
            let (outcome, context) = next.call(context).await;

            if !(config.should_handle)(&outcome) {
                config.event_listeners.emit(&FallbackEvent::Success {
                    pattern_name: config.name.clone(),
                    timestamp: Instant::now(),
                });
                return (outcome, context);
            }

            config.event_listeners.emit(&FallbackEvent::FailedAttempt {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
            });

            let substitute = (config.action)(&outcome, &context);
            config.event_listeners.emit(&FallbackEvent::Applied {
                pattern_name: config.name.clone(),
                timestamp: Instant::now(),
            });

            (Outcome::Result(substitute), context)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resilience_core::FnNext;

    fn failing_next() -> Arc<dyn Next<i32, String>> {
        Arc::new(FnNext::new(|context: ExecutionContext| {
            Box::pin(async move { (Outcome::Exception("down".to_string()), context) })
                as PinFuture<(Outcome<i32, String>, ExecutionContext)>
        }))
    }

    fn succeeding_next(value: i32) -> Arc<dyn Next<i32, String>> {
        Arc::new(FnNext::new(move |context: ExecutionContext| {
            Box::pin(async move { (Outcome::Result(value), context) }) as PinFuture<(Outcome<i32, String>, ExecutionContext)>
        }))
    }

    #[tokio::test]
    async fn a_handled_failure_is_replaced_by_the_fallback_value() {
        let config = FallbackConfigBuilder::value("fallback", -1).build().unwrap();
        let fallback = Fallback::new(config);

        let (outcome, _) = fallback.execute(failing_next(), ExecutionContext::new()).await;
        assert!(matches!(outcome, Outcome::Result(-1)));
    }

    #[tokio::test]
    async fn a_success_passes_through_untouched() {
        let config = FallbackConfigBuilder::value("fallback", -1).build().unwrap();
        let fallback = Fallback::new(config);

        let (outcome, _) = fallback.execute(succeeding_next(7), ExecutionContext::new()).await;
        assert!(matches!(outcome, Outcome::Result(7)));
    }

    #[tokio::test]
    async fn the_fallback_action_can_derive_its_value_from_the_original_error() {
        let config = FallbackConfigBuilder::new("fallback", |outcome: &Outcome<i32, String>, _context| match outcome {
            Outcome::Exception(message) => message.len() as i32,
            Outcome::Result(value) => *value,
        })
        .build()
        .unwrap();
        let fallback = Fallback::new(config);

        let (outcome, _) = fallback.execute(failing_next(), ExecutionContext::new()).await;
        assert!(matches!(outcome, Outcome::Result(4)));
    }

    #[tokio::test]
    async fn a_should_handle_predicate_that_rejects_the_error_skips_the_fallback() {
        let config = FallbackConfigBuilder::value("fallback", -1).should_handle(|_: &Outcome<i32, String>| false).build().unwrap();
        let fallback = Fallback::new(config);

        let (outcome, _) = fallback.execute(failing_next(), ExecutionContext::new()).await;
        assert!(matches!(outcome, Outcome::Exception(_)));
    }
}
