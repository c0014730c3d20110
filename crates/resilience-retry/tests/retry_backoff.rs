use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use resilience_core::{ExecutionContext, FnNext, Next, Outcome, PinFuture, ResilienceError, ResilienceStrategy};
use resilience_retry::{BackoffMode, Retry, RetryConfigBuilder};

fn always_fails(calls: Arc<AtomicUsize>) -> Arc<dyn Next<i32, ResilienceError<String>>> {
    let next = FnNext::new(move |context: ExecutionContext| {
        let calls = calls.clone();
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            (Outcome::Exception(ResilienceError::Inner("unavailable".to_string())), context)
        }) as PinFuture<(Outcome<i32, ResilienceError<String>>, ExecutionContext)>
    });
    Arc::new(next)
}

#[tokio::test]
async fn exponential_backoff_spaces_three_attempts_by_roughly_one_hundred_and_two_hundred_millis() {
    let config = RetryConfigBuilder::<i32, String>::new("retry")
        .max_attempts(3)
        .backoff(BackoffMode::Exponential {
            initial: Duration::from_millis(100),
            multiplier: 2.0,
        })
        .build()
        .unwrap();
    let retry = Retry::new(config);
    let calls = Arc::new(AtomicUsize::new(0));
    let next = always_fails(calls.clone());

    let start = Instant::now();
    let (outcome, _) = retry.execute(next, ExecutionContext::new()).await;
    let elapsed = start.elapsed();

    assert!(matches!(outcome, Outcome::Exception(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 100ms + 200ms between the three attempts, with generous slack for scheduler jitter.
    assert!(elapsed >= Duration::from_millis(280), "elapsed was {elapsed:?}");
    assert!(elapsed < Duration::from_millis(900), "elapsed was {elapsed:?}");
}

#[tokio::test]
async fn cancellation_during_a_one_second_backoff_returns_immediately() {
    let config = RetryConfigBuilder::<i32, String>::new("retry")
        .max_attempts(5)
        .backoff(BackoffMode::Constant(Duration::from_secs(1)))
        .build()
        .unwrap();
    let retry = Retry::new(config);
    let calls = Arc::new(AtomicUsize::new(0));
    let next = always_fails(calls.clone());

    let context = ExecutionContext::new();
    let cancel_handle = context.cancellation().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_handle.cancel();
    });

    let start = Instant::now();
    let (outcome, returned_context) = retry.execute(next, context).await;
    let elapsed = start.elapsed();

    assert!(matches!(outcome, Outcome::Exception(ResilienceError::OperationCanceled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(returned_context.is_canceled());
    assert!(elapsed < Duration::from_millis(900), "elapsed was {elapsed:?}");
}

#[tokio::test]
async fn on_retry_hook_observes_every_retried_attempt() {
    let observed = Arc::new(std::sync::Mutex::new(Vec::new()));
    let observed_clone = observed.clone();
    let config = RetryConfigBuilder::<i32, String>::new("retry")
        .max_attempts(3)
        .backoff(BackoffMode::Constant(Duration::from_millis(1)))
        .on_retry(move |_outcome, attempt, _delay| {
            observed_clone.lock().unwrap().push(attempt);
        })
        .build()
        .unwrap();
    let retry = Retry::new(config);
    let calls = Arc::new(AtomicUsize::new(0));
    let next = always_fails(calls.clone());

    let _ = retry.execute(next, ExecutionContext::new()).await;
    assert_eq!(*observed.lock().unwrap(), vec![0, 1]);
}
