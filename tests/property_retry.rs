//! Property tests for the retry pattern.
//!
//! Invariants tested:
//! - Never exceeds max_attempts
//! - Succeeds on the first attempt that is not handled

use proptest::prelude::*;
use resilience::core::{ExecutionContext, Outcome, PinFuture, ResilienceError, ResiliencePipelineBuilder};
use resilience::{PipelineBuilderExt, RetryConfigBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Debug, Clone, PartialEq)]
struct Flaky;

impl std::fmt::Display for Flaky {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "flaky")
    }
}

impl std::error::Error for Flaky {}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn retry_never_exceeds_max_attempts(max_attempts in 1usize..=10) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let retry = RetryConfigBuilder::<i32, Flaky>::new("prop-retry")
                .max_attempts(max_attempts)
                .backoff(resilience::retry::BackoffMode::Constant(Duration::from_millis(1)))
                .build()
                .unwrap();

            let mut builder: ResiliencePipelineBuilder<i32, ResilienceError<Flaky>> = ResiliencePipelineBuilder::new();
            builder.add_retry(retry);
            let pipeline = builder.build();

            let calls_clone = Arc::clone(&calls);
            let outcome = pipeline
                .execute(
                    move |ctx| {
                        let calls = Arc::clone(&calls_clone);
                        Box::pin(async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            (Outcome::Exception(ResilienceError::Inner(Flaky)), ctx)
                        }) as PinFuture<_>
                    },
                    ExecutionContext::new(),
                )
                .await;

            prop_assert!(outcome.is_exception());
            prop_assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
            Ok(())
        })?;
    }

    #[test]
    fn retry_stops_as_soon_as_an_attempt_succeeds(
        max_attempts in 2usize..=8,
        succeed_on in 0usize..8,
    ) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let calls = Arc::new(AtomicUsize::new(0));
            let retry = RetryConfigBuilder::<i32, Flaky>::new("prop-retry-success")
                .max_attempts(max_attempts)
                .backoff(resilience::retry::BackoffMode::Constant(Duration::from_millis(1)))
                .build()
                .unwrap();

            let mut builder: ResiliencePipelineBuilder<i32, ResilienceError<Flaky>> = ResiliencePipelineBuilder::new();
            builder.add_retry(retry);
            let pipeline = builder.build();

            let calls_clone = Arc::clone(&calls);
            let outcome = pipeline
                .execute(
                    move |ctx| {
                        let calls = Arc::clone(&calls_clone);
                        Box::pin(async move {
                            let attempt = calls.fetch_add(1, Ordering::SeqCst);
                            if attempt >= succeed_on {
                                (Outcome::Result(attempt as i32), ctx)
                            } else {
                                (Outcome::Exception(ResilienceError::Inner(Flaky)), ctx)
                            }
                        }) as PinFuture<_>
                    },
                    ExecutionContext::new(),
                )
                .await;

            let expected_attempts = (succeed_on + 1).min(max_attempts);
            prop_assert_eq!(calls.load(Ordering::SeqCst), expected_attempts);
            if succeed_on < max_attempts {
                prop_assert!(outcome.is_result());
            } else {
                prop_assert!(outcome.is_exception());
            }
            Ok(())
        })?;
    }
}
